//! Random negative events rolled at turn close.
//!
//! One roll per turn against the difficulty's `negative_event_chance`. On a
//! hit, one event is picked uniformly from the table and its effects are
//! applied like an operation's, without a category bonus.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::effects::Effect;
use crate::state::Stat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeEventKind {
    /// Hardware failure eats next turn's compute.
    GpuOutage,
    /// Golden data walks out the door.
    DataLeak,
    /// A bug in a critical path.
    KeyBug,
    LawsuitThreat,
    CloudBillSpike,
    DatasetCorruption,
}

impl NegativeEventKind {
    pub const ALL: [NegativeEventKind; 6] = [
        NegativeEventKind::GpuOutage,
        NegativeEventKind::DataLeak,
        NegativeEventKind::KeyBug,
        NegativeEventKind::LawsuitThreat,
        NegativeEventKind::CloudBillSpike,
        NegativeEventKind::DatasetCorruption,
    ];

    pub fn id(self) -> &'static str {
        match self {
            NegativeEventKind::GpuOutage => "gpu_outage",
            NegativeEventKind::DataLeak => "data_leak",
            NegativeEventKind::KeyBug => "key_bug",
            NegativeEventKind::LawsuitThreat => "lawsuit_threat",
            NegativeEventKind::CloudBillSpike => "cloud_bill_spike",
            NegativeEventKind::DatasetCorruption => "dataset_corruption",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeEvent {
    pub kind: NegativeEventKind,
    pub name: String,
    /// Shown in the log when the event fires.
    pub message: String,
    pub effects: Vec<Effect>,
}

/// The negative-event table, in [`NegativeEventKind::ALL`] order.
pub fn negative_events() -> Vec<NegativeEvent> {
    let event = |kind, name: &str, message: &str, effects| NegativeEvent {
        kind,
        name: name.to_string(),
        message: message.to_string(),
        effects,
    };
    vec![
        event(
            NegativeEventKind::GpuOutage,
            "GPU Outage",
            "A rack of GPUs went dark overnight.",
            vec![Effect::fixed(Stat::ComputePoints, -2), Effect::fixed(Stat::Budget, -1000)],
        ),
        event(
            NegativeEventKind::DataLeak,
            "Data Leak",
            "Part of the training set showed up on a forum.",
            vec![
                Effect::fixed(Stat::GoldenData, -10),
                Effect::fixed(Stat::LegalRisk, 10),
                Effect::fixed(Stat::Reputation, -3),
            ],
        ),
        event(
            NegativeEventKind::KeyBug,
            "Critical Bug",
            "A one-character typo in the loss function.",
            vec![Effect::fixed(Stat::Entropy, 6), Effect::fixed(Stat::Robustness, -3)],
        ),
        event(
            NegativeEventKind::LawsuitThreat,
            "Lawsuit Threat",
            "A rights holder's lawyers sent a letter.",
            vec![Effect::fixed(Stat::LegalRisk, 8), Effect::fixed(Stat::Budget, -1500)],
        ),
        event(
            NegativeEventKind::CloudBillSpike,
            "Cloud Bill Spike",
            "Someone left a cluster running over the weekend.",
            vec![Effect::ranged(Stat::Budget, -3000, -1500)],
        ),
        event(
            NegativeEventKind::DatasetCorruption,
            "Dataset Corruption",
            "A disk failure scrambled part of the data lake.",
            vec![
                Effect::fixed(Stat::DirtyData, -15),
                Effect::fixed(Stat::GoldenData, -5),
                Effect::fixed(Stat::Entropy, 3),
            ],
        ),
    ]
}

/// Roll for an event. `None` when the roll misses or the table is empty.
pub fn roll_negative_event<'a>(
    chance: f64,
    events: &'a [NegativeEvent],
    rng: &mut impl Rng,
) -> Option<&'a NegativeEvent> {
    if !rng.gen_bool(chance.clamp(0.0, 1.0)) {
        return None;
    }
    events.choose(rng)
}
