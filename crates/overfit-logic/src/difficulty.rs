//! Difficulty presets.
//!
//! Chosen once at game creation and never changed. A preset scales the
//! opening budget, negative-event odds, hiring costs, exam penalties and
//! growth, and the dimension gates on later exams and endings.

use serde::{Deserialize, Serialize};

/// Difficulty chosen at game creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Nightmare,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Nightmare,
    ];

    pub fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
            Difficulty::Nightmare => 3,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Nightmare => "nightmare",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.id() == id)
    }
}

/// Exam gate: at least `dim_count` dimensions must reach `value` once
/// the upcoming exam number reaches `exam_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionThreshold {
    pub exam_count: u32,
    pub dim_count: usize,
    pub value: i32,
}

/// Tuning values for one difficulty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub difficulty: Difficulty,
    pub name: String,
    pub initial_budget_multiplier: f64,
    /// Per-turn probability of a negative event.
    pub negative_event_chance: f64,
    pub exam_fail_penalty: i64,
    pub exam_fail_reputation_penalty: i32,
    pub hiring_cost_multiplier: f64,
    /// Compounding growth of exam difficulty per exam passed.
    pub exam_difficulty_growth: f64,
    /// Minimum reward an exam must produce to count as passed.
    pub exam_pass_bar: i64,
    pub threshold1: DimensionThreshold,
    pub threshold2: DimensionThreshold,
    /// Every dimension must reach this for the ascension ending.
    pub ascension_threshold: i32,
    /// Exams passed that end the game in victory.
    pub victory_exams: u32,
}

impl DifficultyConfig {
    /// Gate for the next exam, given exams passed so far.
    ///
    /// `threshold2` wins once both apply; `None` means no gate yet.
    pub fn active_threshold(&self, exams_passed: u32) -> Option<&DimensionThreshold> {
        let upcoming = exams_passed + 1;
        if upcoming >= self.threshold2.exam_count {
            Some(&self.threshold2)
        } else if upcoming >= self.threshold1.exam_count {
            Some(&self.threshold1)
        } else {
            None
        }
    }

    /// Divisor applied to exam rewards: `(1 + growth)^exams_passed`.
    pub fn difficulty_level(&self, exams_passed: u32) -> f64 {
        (1.0 + self.exam_difficulty_growth).powi(exams_passed as i32)
    }
}

/// The four difficulty presets, in [`Difficulty::ALL`] order.
pub fn difficulty_configs() -> [DifficultyConfig; 4] {
    [
        DifficultyConfig {
            difficulty: Difficulty::Easy,
            name: "Easy".to_string(),
            initial_budget_multiplier: 1.5,
            negative_event_chance: 0.10,
            exam_fail_penalty: 1000,
            exam_fail_reputation_penalty: 0,
            hiring_cost_multiplier: 0.8,
            exam_difficulty_growth: 0.10,
            exam_pass_bar: 2000,
            threshold1: DimensionThreshold { exam_count: 3, dim_count: 1, value: 35 },
            threshold2: DimensionThreshold { exam_count: 6, dim_count: 2, value: 50 },
            ascension_threshold: 70,
            victory_exams: 8,
        },
        DifficultyConfig {
            difficulty: Difficulty::Normal,
            name: "Normal".to_string(),
            initial_budget_multiplier: 1.0,
            negative_event_chance: 0.15,
            exam_fail_penalty: 2000,
            exam_fail_reputation_penalty: 0,
            hiring_cost_multiplier: 1.0,
            exam_difficulty_growth: 0.15,
            exam_pass_bar: 3000,
            threshold1: DimensionThreshold { exam_count: 3, dim_count: 1, value: 40 },
            threshold2: DimensionThreshold { exam_count: 6, dim_count: 3, value: 55 },
            ascension_threshold: 80,
            victory_exams: 10,
        },
        DifficultyConfig {
            difficulty: Difficulty::Hard,
            name: "Hard".to_string(),
            initial_budget_multiplier: 0.8,
            negative_event_chance: 0.25,
            exam_fail_penalty: 3500,
            exam_fail_reputation_penalty: 5,
            hiring_cost_multiplier: 1.25,
            exam_difficulty_growth: 0.20,
            exam_pass_bar: 4000,
            threshold1: DimensionThreshold { exam_count: 2, dim_count: 2, value: 45 },
            threshold2: DimensionThreshold { exam_count: 5, dim_count: 3, value: 60 },
            ascension_threshold: 85,
            victory_exams: 12,
        },
        DifficultyConfig {
            difficulty: Difficulty::Nightmare,
            name: "Nightmare".to_string(),
            initial_budget_multiplier: 0.6,
            negative_event_chance: 0.35,
            exam_fail_penalty: 5000,
            exam_fail_reputation_penalty: 10,
            hiring_cost_multiplier: 1.5,
            exam_difficulty_growth: 0.25,
            exam_pass_bar: 5000,
            threshold1: DimensionThreshold { exam_count: 2, dim_count: 2, value: 50 },
            threshold2: DimensionThreshold { exam_count: 4, dim_count: 4, value: 65 },
            ascension_threshold: 90,
            victory_exams: 12,
        },
    ]
}
