//! Game constants: turn cadences, fatal thresholds and gauge ranges.
//!
//! Plain constants with no table dependency. Tunable per-preset values
//! (difficulty, archetype, rarity) live in [`crate::tables`] instead.

/// Schema tag stamped on every serialized [`crate::state::GameState`].
pub const CURRENT_VERSION: &str = "1.2";

pub mod gauges {
    /// Lower bound for every percentage-scale field.
    pub const MIN: i32 = 0;
    /// Upper bound for every percentage-scale field.
    pub const MAX: i32 = 100;
    /// Baseline a dimension is compared against during exams.
    pub const DIMENSION_BASELINE: f64 = 50.0;
}

pub mod cadence {
    /// Turn counter value for a fresh game.
    pub const STARTING_TURN: u32 = 1;
    /// Turns between exams.
    pub const EXAM_INTERVAL: u32 = 5;
    /// Salaries are paid when the closing turn is a multiple of this.
    pub const SALARY_INTERVAL: u32 = 4;
    /// The hiring pool refreshes when the closing turn is a multiple of this.
    pub const HIRING_REFRESH_INTERVAL: u32 = 3;
    /// Candidates offered per refresh.
    pub const HIRING_POOL_SIZE: usize = 3;
    /// Side jobs allowed per turn before archetype bonuses.
    pub const SIDE_JOBS_PER_TURN: u32 = 2;
}

pub mod thresholds {
    /// Entropy at or above which the server melts down.
    pub const MELTDOWN_ENTROPY: i32 = 80;
    /// Consecutive meltdown turn-closes that end the game.
    pub const MELTDOWN_FATAL_TURNS: u32 = 3;
    /// Entropy that ends the game immediately.
    pub const ENTROPY_COLLAPSE: i32 = 100;
    /// Legal risk that ends the game.
    pub const LEGAL_SHUTDOWN: i32 = 100;
    /// Consecutive negative-budget turn-closes that end the game.
    pub const BANKRUPTCY_TURNS: u32 = 2;
    /// Fit score required (with dimensions) for the ascension ending.
    pub const ASCENSION_FIT_SCORE: i32 = 90;
    /// Reputation required for the industry-leader ending.
    pub const INDUSTRY_LEADER_REPUTATION: i32 = 80;
}

pub mod upkeep {
    /// Entropy added at every turn close before cooling mitigation.
    pub const PASSIVE_ENTROPY_DRIFT: i32 = 1;
    /// Cooling bonus percentage points per point of entropy mitigated.
    pub const COOLING_PCT_PER_ENTROPY: u32 = 10;
    /// Budget lost per meltdown turn-close.
    pub const MELTDOWN_BUDGET_PENALTY: i64 = 1000;
    /// Robustness lost per meltdown turn-close.
    pub const MELTDOWN_ROBUSTNESS_PENALTY: i32 = 5;
    /// Stability dimension lost per meltdown turn-close.
    pub const MELTDOWN_STABILITY_PENALTY: i32 = 5;
    /// Reputation gained per exam pass.
    pub const EXAM_PASS_REPUTATION: i32 = 5;
}

pub mod team {
    /// Experience needed per level.
    pub const XP_PER_LEVEL: u32 = 100;
    /// Highest member level.
    pub const MAX_LEVEL: u32 = 5;
    /// Stat points gained on level-up.
    pub const STATS_PER_LEVEL: i32 = 5;
    /// Ceiling on the aggregated operation cost reduction.
    pub const MAX_COST_REDUCTION_PCT: u32 = 50;
    /// Ceiling on the aggregated team training bonus.
    pub const MAX_TRAINING_BONUS_PCT: u32 = 50;
}

pub mod equipment {
    /// Every track starts here.
    pub const MIN_LEVEL: u8 = 1;
    /// Upgrades stop here.
    pub const MAX_LEVEL: u8 = 4;
}

/// Clamp a value into the percentage range.
pub fn clamp_percent(value: i64) -> i32 {
    value.clamp(gauges::MIN as i64, gauges::MAX as i64) as i32
}
