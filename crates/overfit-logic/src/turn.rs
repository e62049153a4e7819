//! Turn engine: closes the current turn.
//!
//! Turn close runs in a fixed order so seeded runs replay exactly:
//!
//! 1. Entropy upkeep (passive drift minus cooling and team mitigation),
//!    compute points refilled to `computeMax`
//! 2. Team salaries, on every `SALARY_INTERVAL`th turn
//! 3. Negative-event roll
//! 4. Derived metrics recomputed
//! 5. Bankruptcy counter; two negative closes in a row end the game here
//! 6. Meltdown check and penalty; sustained meltdown ends the game
//! 7. Exam countdown; the exam may end the game in victory
//! 8. Turn counter advanced, side-job slots reset
//! 9. Hiring pool refreshed on every `HIRING_REFRESH_INTERVAL`th turn
//!    unless a trait freezes it

use log::{info, warn};
use rand::Rng;

use crate::constants::{cadence, thresholds, upkeep};
use crate::effects::{apply_effects, EffectContext, EffectReport, Modifiers};
use crate::ending::victory_ending;
use crate::error::EngineError;
use crate::events::roll_negative_event;
use crate::exam::{describe, run_exam};
use crate::log::{LogEntry, LogKind};
use crate::operations::Transition;
use crate::state::{Dimension, EndingType, GameState, GameStatus, Stat};
use crate::tables::GameTables;
use crate::team;

/// End the game if legal risk or entropy crossed a fatal line.
///
/// Checked after every mutation that can raise either gauge.
pub fn check_immediate_defeat(state: &mut GameState) -> Option<LogEntry> {
    if !state.is_playing() {
        return None;
    }
    let (ending, reason) = if state.risks.legal_risk >= thresholds::LEGAL_SHUTDOWN {
        (EndingType::LegalShutdown, "legal risk reached its limit")
    } else if state.metrics.entropy >= thresholds::ENTROPY_COLLAPSE {
        (EndingType::EntropyCollapse, "entropy reached its limit")
    } else {
        return None;
    };
    state.finish(GameStatus::GameOver, ending, reason);
    info!("game over at turn {}: {}", state.progress.turn, reason);
    Some(LogEntry::new(LogKind::System, state.progress.turn, format!("Game over: {}", reason)))
}

/// Close the current turn on a copy of `state`.
pub fn end_turn(state: &GameState, tables: &GameTables, rng: &mut impl Rng) -> Result<Transition, EngineError> {
    if !state.is_playing() {
        return Err(EngineError::GameFinished(state.game_status));
    }
    let mut next = state.clone();
    let mut log = Vec::new();
    let closing = next.progress.turn;
    let mods = Modifiers::for_state(&next, tables);

    // 1. upkeep
    let drift = mods.ability.entropy_gain(upkeep::PASSIVE_ENTROPY_DRIFT as i64);
    let mitigation = (mods.cooling_pct / upkeep::COOLING_PCT_PER_ENTROPY) as i64
        + mods.team.entropy_mitigation as i64;
    next.adjust(Stat::Entropy, drift - mitigation);
    next.normalize(tables);
    next.resources.compute_points = next.resources.compute_max;

    // 2. salaries
    if closing % cadence::SALARY_INTERVAL == 0 && !next.team.is_empty() {
        let payroll = team::total_salary(&next.team);
        next.adjust(Stat::Budget, -payroll);
        log.push(LogEntry::new(LogKind::System, closing, format!("Paid team salaries: -{}", payroll)));
    }

    // 3. random event
    let chance = tables.difficulty(next.difficulty).negative_event_chance;
    if let Some(event) = roll_negative_event(chance, &tables.events, rng) {
        let ctx = EffectContext::new(&next, tables, None, None);
        let mut report = EffectReport::default();
        apply_effects(&mut next, &event.effects, &ctx, rng, &mut report)?;
        info!("turn {}: {} ({})", closing, event.kind.id(), report.summary());
        log.push(LogEntry::new(
            LogKind::Event,
            closing,
            format!("{}: {} {}", event.name, event.message, report.summary()),
        ));
    }

    // 4. derived metrics
    next.normalize(tables);

    // 5. bankruptcy
    if next.resources.budget < 0 {
        next.progress.consecutive_negative_budget += 1;
    } else {
        next.progress.consecutive_negative_budget = 0;
    }
    if next.progress.consecutive_negative_budget >= thresholds::BANKRUPTCY_TURNS {
        let reason = "budget negative two consecutive turns";
        next.finish(GameStatus::GameOver, EndingType::Bankruptcy, reason);
        info!("game over at turn {}: {}", closing, reason);
        log.push(LogEntry::new(LogKind::System, closing, format!("Game over: {}", reason)));
        return Ok(Transition { state: next, log, exam: None });
    }
    if let Some(entry) = check_immediate_defeat(&mut next) {
        log.push(entry);
        return Ok(Transition { state: next, log, exam: None });
    }

    // 6. meltdown
    if next.metrics.entropy >= thresholds::MELTDOWN_ENTROPY {
        if !next.risks.server_meltdown {
            log.push(LogEntry::new(LogKind::System, closing, "Server meltdown! Entropy is out of control."));
        }
        next.risks.server_meltdown = true;
        next.risks.meltdown_turns += 1;
        next.adjust(Stat::Budget, -upkeep::MELTDOWN_BUDGET_PENALTY);
        next.adjust(Stat::Robustness, -(upkeep::MELTDOWN_ROBUSTNESS_PENALTY as i64));
        next.dimensions.add(Dimension::Stability, -(upkeep::MELTDOWN_STABILITY_PENALTY as i64));
        next.normalize(tables);
        if next.risks.meltdown_turns >= thresholds::MELTDOWN_FATAL_TURNS {
            let reason = "servers melted down three turns in a row";
            next.finish(GameStatus::GameOver, EndingType::EntropyCollapse, reason);
            info!("game over at turn {}: {}", closing, reason);
            log.push(LogEntry::new(LogKind::System, closing, format!("Game over: {}", reason)));
            return Ok(Transition { state: next, log, exam: None });
        }
    } else if next.risks.server_meltdown {
        next.risks.server_meltdown = false;
        next.risks.meltdown_turns = 0;
        log.push(LogEntry::new(LogKind::System, closing, "Servers stabilized."));
    }

    // 7. exam
    let mut exam = None;
    next.progress.turns_until_exam = next.progress.turns_until_exam.saturating_sub(1);
    if next.progress.turns_until_exam == 0 {
        match run_exam(&mut next, tables, rng) {
            Some(result) => {
                log.push(LogEntry::new(LogKind::Exam, closing, describe(&result)));
                exam = Some(result);
            }
            None => {
                warn!("turn {}: exam due but the scenario table is empty", closing);
                log.push(LogEntry::new(LogKind::System, closing, "Exam skipped: no scenarios available."));
            }
        }
        next.progress.turns_until_exam = cadence::EXAM_INTERVAL;
        next.normalize(tables);

        let victory_exams = tables.difficulty(next.difficulty).victory_exams;
        if next.progress.exams_passed >= victory_exams {
            let ending = victory_ending(&next, tables);
            let reason = format!("passed {} exams", next.progress.exams_passed);
            next.finish(GameStatus::Victory, ending, reason.clone());
            info!("victory at turn {}: {}", closing, ending.id());
            log.push(LogEntry::new(LogKind::System, closing, format!("Victory: {}", reason)));
            return Ok(Transition { state: next, log, exam });
        }
    }

    // 8. advance
    next.progress.turn += 1;
    next.progress.side_jobs_this_turn = 0;

    // 9. hiring pool
    if closing % cadence::HIRING_REFRESH_INTERVAL == 0 && !mods.team.hiring_pool_frozen {
        team::refresh_hiring_pool(&mut next, tables, rng);
        log.push(LogEntry::new(LogKind::System, closing, "New candidates are available."));
    }

    next.normalize(tables);
    Ok(Transition { state: next, log, exam })
}
