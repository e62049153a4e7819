//! The game-state aggregate and its construction.
//!
//! [`GameState`] is plain nested data: no function values, no shared
//! references, so it serializes to JSON or bincode as-is. It is created
//! once per session by [`create_game`] and afterwards mutated only by
//! [`crate::operations::apply_operation`] and [`crate::turn::end_turn`],
//! both of which work on a clone and hand back the new state.
//!
//! Every mutation path finishes with [`GameState::normalize`], which
//! re-derives `computeMax`, `dataCapacity`, equipment bonuses and
//! `fitScore` from the current team and equipment, then clamps every
//! gauge into range.

use serde::{Deserialize, Serialize};

use crate::archetypes::Archetype;
use crate::constants::{cadence, clamp_percent, equipment as equipment_limits, gauges, CURRENT_VERSION};
use crate::difficulty::Difficulty;
use crate::equipment::{Equipment, EquipmentTrack};
use crate::tables::GameTables;
use crate::team::{self, TeamMember};

// ── Dimensions ─────────────────────────────────────────────────────

/// One of the four long-term progress gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Algorithm,
    DataProcessing,
    Stability,
    UserExperience,
}

impl Dimension {
    /// All dimensions in display order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Algorithm,
        Dimension::DataProcessing,
        Dimension::Stability,
        Dimension::UserExperience,
    ];

    pub fn index(self) -> usize {
        match self {
            Dimension::Algorithm => 0,
            Dimension::DataProcessing => 1,
            Dimension::Stability => 2,
            Dimension::UserExperience => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Algorithm => "algorithm",
            Dimension::DataProcessing => "data processing",
            Dimension::Stability => "stability",
            Dimension::UserExperience => "user experience",
        }
    }
}

/// Four independent 0–100 gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub algorithm: i32,
    pub data_processing: i32,
    pub stability: i32,
    pub user_experience: i32,
}

impl Dimensions {
    /// Every dimension at the same value.
    pub const fn uniform(value: i32) -> Self {
        Self {
            algorithm: value,
            data_processing: value,
            stability: value,
            user_experience: value,
        }
    }

    pub fn get(&self, dim: Dimension) -> i32 {
        match dim {
            Dimension::Algorithm => self.algorithm,
            Dimension::DataProcessing => self.data_processing,
            Dimension::Stability => self.stability,
            Dimension::UserExperience => self.user_experience,
        }
    }

    /// Set a dimension (clamped to 0–100).
    pub fn set(&mut self, dim: Dimension, value: i64) {
        let v = clamp_percent(value);
        match dim {
            Dimension::Algorithm => self.algorithm = v,
            Dimension::DataProcessing => self.data_processing = v,
            Dimension::Stability => self.stability = v,
            Dimension::UserExperience => self.user_experience = v,
        }
    }

    /// Add a delta to a dimension (clamped to 0–100).
    pub fn add(&mut self, dim: Dimension, delta: i64) {
        self.set(dim, self.get(dim) as i64 + delta);
    }

    /// Mean of all four dimensions.
    pub fn average(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.get(*d) as f64).sum::<f64>() / 4.0
    }

    /// Mean of a subset of dimensions (0 for an empty subset).
    pub fn average_of(&self, dims: &[Dimension]) -> f64 {
        if dims.is_empty() {
            return 0.0;
        }
        dims.iter().map(|d| self.get(*d) as f64).sum::<f64>() / dims.len() as f64
    }

    /// How many dimensions sit at or above `value`.
    pub fn count_at_least(&self, value: i32) -> usize {
        Dimension::ALL
            .iter()
            .filter(|d| self.get(**d) >= value)
            .count()
    }

    fn clamp_all(&mut self) {
        for dim in Dimension::ALL {
            self.set(dim, self.get(dim) as i64);
        }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::uniform(20)
    }
}

// ── Aggregate parts ────────────────────────────────────────────────

/// Spendable resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    /// Signed; may go negative.
    pub budget: i64,
    pub compute_points: u32,
    pub compute_max: u32,
    pub dirty_data: u32,
    pub golden_data: u32,
    /// Caps `dirty_data + golden_data`.
    pub data_capacity: u32,
}

/// Model-quality metrics, all 0–100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Derived from the four sub-scores, never above `fit_score_cap`.
    pub fit_score: i32,
    pub entropy: i32,
    pub fit_score_cap: i32,
    pub accuracy: i32,
    pub speed: i32,
    pub creativity: i32,
    pub robustness: i32,
}

impl Metrics {
    /// Weighted fit score before the cap.
    pub fn raw_fit_score(&self) -> i32 {
        let weighted = 0.4 * self.accuracy as f64
            + 0.2 * self.speed as f64
            + 0.2 * self.creativity as f64
            + 0.2 * self.robustness as f64;
        weighted.round() as i32
    }
}

/// Turn bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub turn: u32,
    pub turns_until_exam: u32,
    pub consecutive_negative_budget: u32,
    pub exams_passed: u32,
    pub side_jobs_this_turn: u32,
}

/// Failure-mode gauges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risks {
    pub legal_risk: i32,
    pub server_meltdown: bool,
    /// Consecutive turn-closes spent in meltdown.
    pub meltdown_turns: u32,
}

/// Lifecycle of a session. Leaves `Playing` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Playing,
    GameOver,
    Victory,
}

/// The condition that ended the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingType {
    Bankruptcy,
    EntropyCollapse,
    LegalShutdown,
    Graduation,
    IndustryLeader,
    Ascension,
}

impl EndingType {
    pub fn is_victory(self) -> bool {
        matches!(
            self,
            EndingType::Graduation | EndingType::IndustryLeader | EndingType::Ascension
        )
    }

    pub fn id(self) -> &'static str {
        match self {
            EndingType::Bankruptcy => "bankruptcy",
            EndingType::EntropyCollapse => "entropy_collapse",
            EndingType::LegalShutdown => "legal_shutdown",
            EndingType::Graduation => "graduation",
            EndingType::IndustryLeader => "industry_leader",
            EndingType::Ascension => "ascension",
        }
    }
}

/// A single numeric field an effect can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stat {
    Budget,
    ComputePoints,
    DirtyData,
    GoldenData,
    Accuracy,
    Speed,
    Creativity,
    Robustness,
    Entropy,
    FitScoreCap,
    LegalRisk,
    Reputation,
}

impl Stat {
    pub fn label(self) -> &'static str {
        match self {
            Stat::Budget => "budget",
            Stat::ComputePoints => "compute",
            Stat::DirtyData => "dirty data",
            Stat::GoldenData => "golden data",
            Stat::Accuracy => "accuracy",
            Stat::Speed => "speed",
            Stat::Creativity => "creativity",
            Stat::Robustness => "robustness",
            Stat::Entropy => "entropy",
            Stat::FitScoreCap => "fit score cap",
            Stat::LegalRisk => "legal risk",
            Stat::Reputation => "reputation",
        }
    }

    /// Model-quality sub-scores that training amplifies.
    pub fn is_model_metric(self) -> bool {
        matches!(
            self,
            Stat::Accuracy | Stat::Speed | Stat::Creativity | Stat::Robustness
        )
    }

    pub fn is_data(self) -> bool {
        matches!(self, Stat::DirtyData | Stat::GoldenData)
    }
}

// ── GameState ──────────────────────────────────────────────────────

/// Root aggregate for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub version: String,
    pub resources: Resources,
    pub metrics: Metrics,
    pub dimensions: Dimensions,
    pub progress: Progress,
    pub risks: Risks,
    pub equipment: Equipment,
    pub archetype: Archetype,
    pub difficulty: Difficulty,
    pub reputation: i32,
    pub team: Vec<TeamMember>,
    pub hiring_pool: Vec<TeamMember>,
    /// Next id handed to a generated candidate.
    pub next_member_id: u32,
    pub game_status: GameStatus,
    pub game_over_reason: Option<String>,
    pub ending_type: Option<EndingType>,
}

impl GameState {
    pub fn is_playing(&self) -> bool {
        self.game_status == GameStatus::Playing
    }

    /// Move a stat by `delta`, clamping to its valid range.
    ///
    /// Data fields are floored at zero here; the capacity trim happens in
    /// [`GameState::normalize`], which discards dirty data before golden.
    pub fn adjust(&mut self, stat: Stat, delta: i64) {
        let r = &mut self.resources;
        let m = &mut self.metrics;
        match stat {
            Stat::Budget => r.budget = r.budget.saturating_add(delta),
            Stat::ComputePoints => {
                r.compute_points = (r.compute_points as i64 + delta).clamp(0, r.compute_max as i64) as u32
            }
            Stat::DirtyData => r.dirty_data = (r.dirty_data as i64 + delta).clamp(0, u32::MAX as i64) as u32,
            Stat::GoldenData => {
                r.golden_data = (r.golden_data as i64 + delta).clamp(0, u32::MAX as i64) as u32
            }
            Stat::Accuracy => m.accuracy = clamp_percent(m.accuracy as i64 + delta),
            Stat::Speed => m.speed = clamp_percent(m.speed as i64 + delta),
            Stat::Creativity => m.creativity = clamp_percent(m.creativity as i64 + delta),
            Stat::Robustness => m.robustness = clamp_percent(m.robustness as i64 + delta),
            Stat::Entropy => m.entropy = clamp_percent(m.entropy as i64 + delta),
            Stat::FitScoreCap => m.fit_score_cap = clamp_percent(m.fit_score_cap as i64 + delta),
            Stat::LegalRisk => {
                self.risks.legal_risk = clamp_percent(self.risks.legal_risk as i64 + delta)
            }
            Stat::Reputation => self.reputation = clamp_percent(self.reputation as i64 + delta),
        }
        self.trim_data();
    }

    /// Current value of a stat.
    pub fn stat(&self, stat: Stat) -> i64 {
        let r = &self.resources;
        let m = &self.metrics;
        match stat {
            Stat::Budget => r.budget,
            Stat::ComputePoints => r.compute_points as i64,
            Stat::DirtyData => r.dirty_data as i64,
            Stat::GoldenData => r.golden_data as i64,
            Stat::Accuracy => m.accuracy as i64,
            Stat::Speed => m.speed as i64,
            Stat::Creativity => m.creativity as i64,
            Stat::Robustness => m.robustness as i64,
            Stat::Entropy => m.entropy as i64,
            Stat::FitScoreCap => m.fit_score_cap as i64,
            Stat::LegalRisk => self.risks.legal_risk as i64,
            Stat::Reputation => self.reputation as i64,
        }
    }

    /// Re-derive team/equipment-dependent fields and clamp every gauge.
    pub fn normalize(&mut self, tables: &GameTables) {
        let base = tables.archetype(self.archetype);
        let modifiers = team::aggregate(&self.team, tables);

        self.resources.compute_max = base.compute_max + modifiers.compute_bonus;
        self.resources.compute_points = self.resources.compute_points.min(self.resources.compute_max);

        for track in EquipmentTrack::ALL {
            let slot = self.equipment.get_mut(track);
            slot.level = slot.level.clamp(equipment_limits::MIN_LEVEL, equipment_limits::MAX_LEVEL);
            slot.bonus_percent = tables.equipment(track).bonus_percent(slot.level);
        }
        let storage_pct = self.equipment.storage.bonus_percent;
        self.resources.data_capacity =
            (base.data_capacity as u64 * (100 + storage_pct as u64) / 100) as u32;
        self.trim_data();

        let m = &mut self.metrics;
        for v in [
            &mut m.entropy,
            &mut m.fit_score_cap,
            &mut m.accuracy,
            &mut m.speed,
            &mut m.creativity,
            &mut m.robustness,
        ] {
            *v = clamp_percent(*v as i64);
        }
        m.fit_score = m.raw_fit_score().min(m.fit_score_cap).clamp(gauges::MIN, gauges::MAX);

        self.dimensions.clamp_all();
        self.risks.legal_risk = clamp_percent(self.risks.legal_risk as i64);
        self.reputation = clamp_percent(self.reputation as i64);
    }

    /// Enter a terminal status. Has no effect once the game has ended.
    pub fn finish(&mut self, status: GameStatus, ending: EndingType, reason: impl Into<String>) {
        if !self.is_playing() || status == GameStatus::Playing {
            return;
        }
        self.game_status = status;
        self.ending_type = Some(ending);
        self.game_over_reason = Some(reason.into());
    }

    fn trim_data(&mut self) {
        let r = &mut self.resources;
        let total = r.dirty_data as u64 + r.golden_data as u64;
        if total <= r.data_capacity as u64 {
            return;
        }
        let mut overflow = total - r.data_capacity as u64;
        let from_dirty = overflow.min(r.dirty_data as u64);
        r.dirty_data -= from_dirty as u32;
        overflow -= from_dirty;
        r.golden_data -= overflow.min(r.golden_data as u64) as u32;
    }
}

/// Build the opening state for an (archetype, difficulty) pair.
///
/// Deterministic: the hiring pool starts empty and is filled by the
/// caller with [`crate::team::refresh_hiring_pool`].
pub fn create_game(archetype: Archetype, difficulty: Difficulty, tables: &GameTables) -> GameState {
    let base = tables.archetype(archetype);
    let diff = tables.difficulty(difficulty);
    let budget = (base.base_budget as f64 * diff.initial_budget_multiplier).round() as i64;

    let mut state = GameState {
        version: CURRENT_VERSION.to_string(),
        resources: Resources {
            budget,
            compute_points: base.compute_max,
            compute_max: base.compute_max,
            dirty_data: base.dirty_data,
            golden_data: base.golden_data,
            data_capacity: base.data_capacity,
        },
        metrics: Metrics {
            fit_score: 0,
            entropy: base.entropy,
            fit_score_cap: base.fit_score_cap,
            accuracy: base.accuracy,
            speed: base.speed,
            creativity: base.creativity,
            robustness: base.robustness,
        },
        dimensions: base.dimensions,
        progress: Progress {
            turn: cadence::STARTING_TURN,
            turns_until_exam: cadence::EXAM_INTERVAL,
            consecutive_negative_budget: 0,
            exams_passed: 0,
            side_jobs_this_turn: 0,
        },
        risks: Risks {
            legal_risk: 0,
            server_meltdown: false,
            meltdown_turns: 0,
        },
        equipment: Equipment::default(),
        archetype,
        difficulty,
        reputation: base.reputation,
        team: Vec::new(),
        hiring_pool: Vec::new(),
        next_member_id: 1,
        game_status: GameStatus::Playing,
        game_over_reason: None,
        ending_type: None,
    };
    state.normalize(tables);
    state
}
