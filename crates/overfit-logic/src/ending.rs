//! Score and ending resolution.
//!
//! ```text
//! score = turn×10 + examsPassed×500 + fitScore×20 + avgDimension×10
//!       + reputation×15 + max(0, budget)/100 − entropy×5        (floored at 0)
//! ```
//!
//! Victories grade on SSS/SS/S/A, defeats on B/C/D/F.

use serde::{Deserialize, Serialize};

use crate::constants::thresholds;
use crate::state::{EndingType, GameState, GameStatus};
use crate::tables::GameTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    SSS,
    SS,
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::SSS => "SSS",
            Grade::SS => "SS",
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// Display record for a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingSummary {
    pub score: i64,
    pub grade: Grade,
    pub title: String,
    pub ending_type: EndingType,
}

pub fn compute_score(state: &GameState) -> i64 {
    let p = &state.progress;
    let m = &state.metrics;
    let score = p.turn as f64 * 10.0
        + p.exams_passed as f64 * 500.0
        + m.fit_score as f64 * 20.0
        + state.dimensions.average() * 10.0
        + state.reputation as f64 * 15.0
        + state.resources.budget.max(0) as f64 / 100.0
        - m.entropy as f64 * 5.0;
    score.floor().max(0.0) as i64
}

pub fn grade_for(score: i64, victory: bool) -> Grade {
    if victory {
        match score {
            s if s >= 20_000 => Grade::SSS,
            s if s >= 15_000 => Grade::SS,
            s if s >= 10_000 => Grade::S,
            _ => Grade::A,
        }
    } else {
        match score {
            s if s >= 8000 => Grade::B,
            s if s >= 5000 => Grade::C,
            s if s >= 2000 => Grade::D,
            _ => Grade::F,
        }
    }
}

pub fn title_for(ending: EndingType) -> &'static str {
    match ending {
        EndingType::Bankruptcy => "Out of Runway",
        EndingType::EntropyCollapse => "Heat Death of the Codebase",
        EndingType::LegalShutdown => "Cease and Desist",
        EndingType::Graduation => "Graduation Day",
        EndingType::IndustryLeader => "Industry Leader",
        EndingType::Ascension => "Ascension",
    }
}

/// Which victory ending a state earns when the final exam is passed.
pub fn victory_ending(state: &GameState, tables: &GameTables) -> EndingType {
    let diff = tables.difficulty(state.difficulty);
    let all_dims = state.dimensions.count_at_least(diff.ascension_threshold) == 4;
    if all_dims && state.metrics.fit_score >= thresholds::ASCENSION_FIT_SCORE {
        EndingType::Ascension
    } else if state.reputation >= thresholds::INDUSTRY_LEADER_REPUTATION {
        EndingType::IndustryLeader
    } else {
        EndingType::Graduation
    }
}

/// Summary for a terminal state; `None` while the game is still playing.
pub fn resolve_ending(state: &GameState) -> Option<EndingSummary> {
    let ending_type = state.ending_type?;
    if state.game_status == GameStatus::Playing {
        return None;
    }
    let score = compute_score(state);
    Some(EndingSummary {
        score,
        grade: grade_for(score, state.game_status == GameStatus::Victory),
        title: title_for(ending_type).to_string(),
        ending_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::Archetype;
    use crate::difficulty::Difficulty;
    use crate::state::{create_game, Dimensions};

    fn state() -> (GameState, GameTables) {
        let tables = GameTables::standard();
        (create_game(Archetype::Startup, Difficulty::Normal, &tables), tables)
    }

    #[test]
    fn test_score_formula() {
        let (mut s, _) = state();
        s.progress.turn = 10;
        s.progress.exams_passed = 2;
        s.metrics.fit_score = 50;
        s.dimensions = Dimensions::uniform(40);
        s.reputation = 20;
        s.resources.budget = 12_345;
        s.metrics.entropy = 30;
        // 100 + 1000 + 1000 + 400 + 300 + 123 - 150
        assert_eq!(compute_score(&s), 2773);
    }

    #[test]
    fn test_score_ignores_debt_and_floors_at_zero() {
        let (mut s, _) = state();
        s.progress.turn = 1;
        s.metrics.fit_score = 0;
        s.dimensions = Dimensions::uniform(0);
        s.reputation = 0;
        s.resources.budget = -50_000;
        s.metrics.entropy = 100;
        assert_eq!(compute_score(&s), 0);
    }

    #[test]
    fn test_grade_scales() {
        assert_eq!(grade_for(25_000, true), Grade::SSS);
        assert_eq!(grade_for(15_000, true), Grade::SS);
        assert_eq!(grade_for(10_000, true), Grade::S);
        assert_eq!(grade_for(100, true), Grade::A);
        assert_eq!(grade_for(25_000, false), Grade::B);
        assert_eq!(grade_for(5000, false), Grade::C);
        assert_eq!(grade_for(2000, false), Grade::D);
        assert_eq!(grade_for(1999, false), Grade::F);
    }

    #[test]
    fn test_victory_ending_selection() {
        let (mut s, tables) = state();
        assert_eq!(victory_ending(&s, &tables), EndingType::Graduation);
        s.reputation = 85;
        assert_eq!(victory_ending(&s, &tables), EndingType::IndustryLeader);
        s.dimensions = Dimensions::uniform(80);
        s.metrics.fit_score = 90;
        assert_eq!(victory_ending(&s, &tables), EndingType::Ascension);
        s.dimensions.stability = 79;
        assert_eq!(victory_ending(&s, &tables), EndingType::IndustryLeader);
    }

    #[test]
    fn test_resolve_only_when_terminal() {
        let (mut s, _) = state();
        assert!(resolve_ending(&s).is_none());
        s.finish(GameStatus::GameOver, EndingType::Bankruptcy, "broke");
        let summary = resolve_ending(&s).unwrap();
        assert_eq!(summary.ending_type, EndingType::Bankruptcy);
        assert!(summary.grade >= Grade::B);
        assert_eq!(summary.title, "Out of Runway");
    }
}
