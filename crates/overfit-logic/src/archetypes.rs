//! Lab archetypes: immutable starting-condition presets.
//!
//! The player picks exactly one archetype when creating a game. It fixes
//! the opening resources and metrics and grants one special ability that
//! stays active for the whole session.

use serde::{Deserialize, Serialize};

use crate::state::Dimensions;

/// Starting preset chosen at game creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// Scrappy and cash-poor. Can take on extra side jobs.
    Startup,
    /// Deep pockets and brand recognition. Exams pay more.
    BigTech,
    /// Strong fundamentals, careful engineering. Accumulates entropy slower.
    Academic,
}

impl Archetype {
    /// All archetype variants for iteration.
    pub const ALL: [Archetype; 3] = [Archetype::Startup, Archetype::BigTech, Archetype::Academic];

    pub fn index(self) -> usize {
        match self {
            Archetype::Startup => 0,
            Archetype::BigTech => 1,
            Archetype::Academic => 2,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Archetype::Startup => "startup",
            Archetype::BigTech => "bigtech",
            Archetype::Academic => "academic",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }
}

/// Special ability granted by an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    /// +1 side job per turn.
    SideHustle,
    /// +10% exam reward.
    BrandPower,
    /// Entropy gains scaled to 75%.
    PeerReview,
}

impl Ability {
    /// Extra side jobs allowed per turn.
    pub fn side_job_bonus(self) -> u32 {
        match self {
            Ability::SideHustle => 1,
            _ => 0,
        }
    }

    /// Multiplier on a passed exam's reward.
    pub fn exam_reward_multiplier(self) -> f64 {
        match self {
            Ability::BrandPower => 1.1,
            _ => 1.0,
        }
    }

    /// Scale a positive entropy gain. Reductions pass through unchanged.
    pub fn entropy_gain(self, amount: i64) -> i64 {
        match self {
            Ability::PeerReview if amount > 0 => (amount * 3 + 3) / 4,
            _ => amount,
        }
    }
}

/// Opening values for one archetype, before the difficulty multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub archetype: Archetype,
    pub name: String,
    pub base_budget: i64,
    pub compute_max: u32,
    pub dirty_data: u32,
    pub golden_data: u32,
    pub data_capacity: u32,
    pub accuracy: i32,
    pub speed: i32,
    pub creativity: i32,
    pub robustness: i32,
    pub entropy: i32,
    pub fit_score_cap: i32,
    pub dimensions: Dimensions,
    pub reputation: i32,
    pub ability: Ability,
}

/// The three archetype presets, in [`Archetype::ALL`] order.
pub fn archetype_configs() -> [ArchetypeConfig; 3] {
    [
        ArchetypeConfig {
            archetype: Archetype::Startup,
            name: "Garage Startup".to_string(),
            base_budget: 20_000,
            compute_max: 5,
            dirty_data: 40,
            golden_data: 5,
            data_capacity: 200,
            accuracy: 20,
            speed: 25,
            creativity: 30,
            robustness: 15,
            entropy: 15,
            fit_score_cap: 60,
            dimensions: Dimensions::uniform(20),
            reputation: 10,
            ability: Ability::SideHustle,
        },
        ArchetypeConfig {
            archetype: Archetype::BigTech,
            name: "Big Tech Lab".to_string(),
            base_budget: 50_000,
            compute_max: 6,
            dirty_data: 80,
            golden_data: 20,
            data_capacity: 300,
            accuracy: 30,
            speed: 25,
            creativity: 15,
            robustness: 25,
            entropy: 20,
            fit_score_cap: 60,
            dimensions: Dimensions::uniform(20),
            reputation: 30,
            ability: Ability::BrandPower,
        },
        ArchetypeConfig {
            archetype: Archetype::Academic,
            name: "University Lab".to_string(),
            base_budget: 15_000,
            compute_max: 7,
            dirty_data: 20,
            golden_data: 30,
            data_capacity: 250,
            accuracy: 35,
            speed: 15,
            creativity: 25,
            robustness: 20,
            entropy: 10,
            fit_score_cap: 65,
            dimensions: Dimensions {
                algorithm: 30,
                ..Dimensions::uniform(20)
            },
            reputation: 20,
            ability: Ability::PeerReview,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configs_follow_variant_order() {
        for (i, cfg) in archetype_configs().iter().enumerate() {
            assert_eq!(cfg.archetype, Archetype::ALL[i]);
            assert_eq!(cfg.archetype.index(), i);
        }
    }

    #[test]
    fn test_id_round_trip() {
        for a in Archetype::ALL {
            assert_eq!(Archetype::from_id(a.id()), Some(a));
        }
        assert_eq!(Archetype::from_id("nonprofit"), None);
    }

    #[test]
    fn test_side_hustle_adds_side_job() {
        assert_eq!(Ability::SideHustle.side_job_bonus(), 1);
        assert_eq!(Ability::BrandPower.side_job_bonus(), 0);
    }

    #[test]
    fn test_brand_power_reward() {
        assert!(Ability::BrandPower.exam_reward_multiplier() > 1.0);
        assert!((Ability::PeerReview.exam_reward_multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_peer_review_entropy() {
        assert_eq!(Ability::PeerReview.entropy_gain(4), 3);
        assert_eq!(Ability::PeerReview.entropy_gain(-8), -8);
        assert_eq!(Ability::SideHustle.entropy_gain(4), 4);
    }

    #[test]
    fn test_bigtech_is_richest() {
        let configs = archetype_configs();
        let bigtech = &configs[Archetype::BigTech.index()];
        assert!(configs.iter().all(|c| c.base_budget <= bigtech.base_budget));
    }
}
