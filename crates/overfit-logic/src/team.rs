//! Team and hiring: candidate generation, trait aggregation, progression.
//!
//! # Candidates
//!
//! A candidate's rarity is rolled from a weighted table (common 60%,
//! rare 25%, epic 12%, legendary 3%). Rarity fixes the number of trait
//! slots, the stat range, and the hiring cost and salary tier. Traits are
//! drawn without replacement from the eight-entry trait catalog.
//!
//! # Aggregation
//!
//! [`aggregate`] folds every hired member's traits and stats into a
//! [`TeamModifiers`] value. It is recomputed on each read, so team changes
//! are reflected immediately.
//!
//! # Progression
//!
//! Members gain experience from team-management operations and level up
//! every 100 experience, raising each stat.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{cadence, team as limits};
use crate::difficulty::Difficulty;
use crate::names::generate_name;
use crate::state::{Dimension, GameState};
use crate::tables::GameTables;

// ── Rarity ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];

    pub fn index(self) -> usize {
        match self {
            Rarity::Common => 0,
            Rarity::Rare => 1,
            Rarity::Epic => 2,
            Rarity::Legendary => 3,
        }
    }
}

/// Generation tier for one rarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RarityConfig {
    pub rarity: Rarity,
    /// Relative roll weight (the table sums to 100).
    pub weight: u32,
    pub trait_slots: usize,
    /// Hiring cost before the difficulty multiplier.
    pub hiring_cost: i64,
    pub salary: i64,
    pub stat_min: i32,
    pub stat_max: i32,
}

/// The four rarity tiers, in [`Rarity::ALL`] order.
pub fn rarity_configs() -> [RarityConfig; 4] {
    [
        RarityConfig {
            rarity: Rarity::Common,
            weight: 60,
            trait_slots: 0,
            hiring_cost: 800,
            salary: 300,
            stat_min: 20,
            stat_max: 45,
        },
        RarityConfig {
            rarity: Rarity::Rare,
            weight: 25,
            trait_slots: 1,
            hiring_cost: 1500,
            salary: 500,
            stat_min: 35,
            stat_max: 60,
        },
        RarityConfig {
            rarity: Rarity::Epic,
            weight: 12,
            trait_slots: 2,
            hiring_cost: 3000,
            salary: 900,
            stat_min: 50,
            stat_max: 75,
        },
        RarityConfig {
            rarity: Rarity::Legendary,
            weight: 3,
            trait_slots: 3,
            hiring_cost: 6000,
            salary: 1600,
            stat_min: 65,
            stat_max: 90,
        },
    ]
}

// ── Traits ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    AlgorithmExpert,
    DataEngineer,
    SiteReliability,
    ProductDesigner,
    HardwareHacker,
    Frugal,
    Scraper,
    Headhunter,
}

impl Trait {
    pub const ALL: [Trait; 8] = [
        Trait::AlgorithmExpert,
        Trait::DataEngineer,
        Trait::SiteReliability,
        Trait::ProductDesigner,
        Trait::HardwareHacker,
        Trait::Frugal,
        Trait::Scraper,
        Trait::Headhunter,
    ];

    pub fn index(self) -> usize {
        match self {
            Trait::AlgorithmExpert => 0,
            Trait::DataEngineer => 1,
            Trait::SiteReliability => 2,
            Trait::ProductDesigner => 3,
            Trait::HardwareHacker => 4,
            Trait::Frugal => 5,
            Trait::Scraper => 6,
            Trait::Headhunter => 7,
        }
    }
}

/// What one trait contributes to the team aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitEffects {
    /// Flat add to positive gains, indexed by [`Dimension::index`].
    pub dimension_bonus: [i32; 4],
    pub compute_bonus: u32,
    pub cost_reduction_pct: u32,
    pub data_bonus_pct: u32,
    /// Stops the periodic hiring-pool refresh.
    pub freezes_hiring_pool: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitConfig {
    pub trait_kind: Trait,
    pub name: String,
    pub effects: TraitEffects,
}

fn dimension_bonus(dim: Dimension, amount: i32) -> [i32; 4] {
    let mut bonus = [0; 4];
    bonus[dim.index()] = amount;
    bonus
}

/// The eight trait presets, in [`Trait::ALL`] order.
pub fn trait_configs() -> [TraitConfig; 8] {
    [
        TraitConfig {
            trait_kind: Trait::AlgorithmExpert,
            name: "Algorithm Expert".to_string(),
            effects: TraitEffects {
                dimension_bonus: dimension_bonus(Dimension::Algorithm, 3),
                ..Default::default()
            },
        },
        TraitConfig {
            trait_kind: Trait::DataEngineer,
            name: "Data Engineer".to_string(),
            effects: TraitEffects {
                dimension_bonus: dimension_bonus(Dimension::DataProcessing, 3),
                data_bonus_pct: 10,
                ..Default::default()
            },
        },
        TraitConfig {
            trait_kind: Trait::SiteReliability,
            name: "Site Reliability".to_string(),
            effects: TraitEffects {
                dimension_bonus: dimension_bonus(Dimension::Stability, 3),
                ..Default::default()
            },
        },
        TraitConfig {
            trait_kind: Trait::ProductDesigner,
            name: "Product Designer".to_string(),
            effects: TraitEffects {
                dimension_bonus: dimension_bonus(Dimension::UserExperience, 3),
                ..Default::default()
            },
        },
        TraitConfig {
            trait_kind: Trait::HardwareHacker,
            name: "Hardware Hacker".to_string(),
            effects: TraitEffects {
                compute_bonus: 1,
                ..Default::default()
            },
        },
        TraitConfig {
            trait_kind: Trait::Frugal,
            name: "Frugal".to_string(),
            effects: TraitEffects {
                cost_reduction_pct: 5,
                ..Default::default()
            },
        },
        TraitConfig {
            trait_kind: Trait::Scraper,
            name: "Scraper".to_string(),
            effects: TraitEffects {
                data_bonus_pct: 20,
                ..Default::default()
            },
        },
        TraitConfig {
            trait_kind: Trait::Headhunter,
            name: "Headhunter".to_string(),
            effects: TraitEffects {
                cost_reduction_pct: 2,
                freezes_hiring_pool: true,
                ..Default::default()
            },
        },
    ]
}

// ── Members ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStats {
    /// Feeds the team training bonus.
    pub coding: i32,
    /// Feeds the team dimension-gain bonus.
    pub research: i32,
    /// Feeds per-turn entropy mitigation.
    pub ops: i32,
}

/// A hired member or a candidate in the hiring pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: u32,
    pub name: String,
    pub rarity: Rarity,
    pub stats: MemberStats,
    pub traits: Vec<Trait>,
    pub level: u32,
    pub experience: u32,
    pub hiring_cost: i64,
    pub salary: i64,
}

impl TeamMember {
    /// Add experience, levelling up as thresholds are crossed.
    /// Returns the number of levels gained.
    pub fn grant_experience(&mut self, xp: u32) -> u32 {
        if self.level >= limits::MAX_LEVEL {
            return 0;
        }
        self.experience += xp;
        let mut gained = 0;
        while self.experience >= limits::XP_PER_LEVEL && self.level < limits::MAX_LEVEL {
            self.experience -= limits::XP_PER_LEVEL;
            self.level += 1;
            gained += 1;
            for stat in [&mut self.stats.coding, &mut self.stats.research, &mut self.stats.ops] {
                *stat = (*stat + limits::STATS_PER_LEVEL).min(100);
            }
        }
        if self.level >= limits::MAX_LEVEL {
            self.experience = 0;
        }
        gained
    }
}

/// Aggregated team contributions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamModifiers {
    pub dimension_bonus: [i32; 4],
    pub compute_bonus: u32,
    pub cost_reduction_pct: u32,
    pub data_bonus_pct: u32,
    pub training_bonus_pct: u32,
    pub research_bonus_pct: u32,
    pub entropy_mitigation: i32,
    pub hiring_pool_frozen: bool,
}

impl TeamModifiers {
    pub fn dimension_bonus(&self, dim: Dimension) -> i32 {
        self.dimension_bonus[dim.index()]
    }
}

/// Fold the team's traits and stats into one set of modifiers.
pub fn aggregate(team: &[TeamMember], tables: &GameTables) -> TeamModifiers {
    let mut mods = TeamModifiers::default();
    let mut coding = 0u32;
    let mut research = 0u32;
    let mut ops = 0i32;

    for member in team {
        for t in &member.traits {
            let fx = &tables.trait_config(*t).effects;
            for (acc, bonus) in mods.dimension_bonus.iter_mut().zip(fx.dimension_bonus) {
                *acc += bonus;
            }
            mods.compute_bonus += fx.compute_bonus;
            mods.cost_reduction_pct += fx.cost_reduction_pct;
            mods.data_bonus_pct += fx.data_bonus_pct;
            mods.hiring_pool_frozen |= fx.freezes_hiring_pool;
        }
        let level_bonus = limits::STATS_PER_LEVEL as u32 * member.level.saturating_sub(1);
        coding += member.stats.coding.max(0) as u32 + level_bonus;
        research += member.stats.research.max(0) as u32;
        ops += member.stats.ops.max(0);
    }

    mods.cost_reduction_pct = mods.cost_reduction_pct.min(limits::MAX_COST_REDUCTION_PCT);
    mods.training_bonus_pct = (coding / 10).min(limits::MAX_TRAINING_BONUS_PCT);
    mods.research_bonus_pct = (research / 10).min(limits::MAX_TRAINING_BONUS_PCT);
    mods.entropy_mitigation = ops / 100;
    mods
}

/// Salary owed by the whole team for one pay period.
pub fn total_salary(team: &[TeamMember]) -> i64 {
    team.iter().map(|m| m.salary).sum()
}

// ── Generation ─────────────────────────────────────────────────────

/// Roll a rarity from the weighted table.
pub fn roll_rarity(tables: &GameTables, rng: &mut impl Rng) -> Rarity {
    let total: u32 = tables.rarities.iter().map(|r| r.weight).sum();
    if total == 0 {
        return Rarity::Common;
    }
    let mut roll = rng.gen_range(0..total);
    for cfg in &tables.rarities {
        if roll < cfg.weight {
            return cfg.rarity;
        }
        roll -= cfg.weight;
    }
    Rarity::Common
}

/// Generate one candidate with the given id.
pub fn generate_candidate(
    id: u32,
    difficulty: Difficulty,
    tables: &GameTables,
    rng: &mut impl Rng,
) -> TeamMember {
    let rarity = roll_rarity(tables, rng);
    let tier = tables.rarity(rarity);
    let (lo, hi) = (tier.stat_min.min(tier.stat_max), tier.stat_min.max(tier.stat_max));

    let traits: Vec<Trait> = Trait::ALL
        .choose_multiple(rng, tier.trait_slots.min(Trait::ALL.len()))
        .copied()
        .collect();

    let multiplier = tables.difficulty(difficulty).hiring_cost_multiplier;
    TeamMember {
        id,
        name: generate_name(rng),
        rarity,
        stats: MemberStats {
            coding: rng.gen_range(lo..=hi),
            research: rng.gen_range(lo..=hi),
            ops: rng.gen_range(lo..=hi),
        },
        traits,
        level: 1,
        experience: 0,
        hiring_cost: (tier.hiring_cost as f64 * multiplier).round() as i64,
        salary: tier.salary,
    }
}

/// Replace the hiring pool with fresh candidates.
pub fn refresh_hiring_pool(state: &mut GameState, tables: &GameTables, rng: &mut impl Rng) {
    // never hand out an id a team member already holds
    let floor = state.team.iter().map(|m| m.id + 1).max().unwrap_or(0);
    state.next_member_id = state.next_member_id.max(floor);
    let mut pool = Vec::with_capacity(cadence::HIRING_POOL_SIZE);
    for _ in 0..cadence::HIRING_POOL_SIZE {
        let id = state.next_member_id;
        state.next_member_id += 1;
        pool.push(generate_candidate(id, state.difficulty, tables, rng));
    }
    state.hiring_pool = pool;
}

/// Move a candidate from the hiring pool to the team. Budget is not touched.
pub fn take_candidate(state: &mut GameState, member_id: u32) -> Option<TeamMember> {
    let pos = state.hiring_pool.iter().position(|m| m.id == member_id)?;
    let member = state.hiring_pool.remove(pos);
    state.team.push(member.clone());
    Some(member)
}

/// Remove a member from the team.
pub fn release_member(state: &mut GameState, member_id: u32) -> Option<TeamMember> {
    let pos = state.team.iter().position(|m| m.id == member_id)?;
    Some(state.team.remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::Archetype;
    use crate::state::create_game;
    use rand::{rngs::SmallRng, SeedableRng};

    fn member(traits: Vec<Trait>) -> TeamMember {
        TeamMember {
            id: 1,
            name: "Test".into(),
            rarity: Rarity::Rare,
            stats: MemberStats { coding: 50, research: 40, ops: 60 },
            traits,
            level: 1,
            experience: 0,
            hiring_cost: 1500,
            salary: 500,
        }
    }

    #[test]
    fn test_rarity_distribution() {
        let tables = GameTables::standard();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [0u32; 4];
        for _ in 0..20_000 {
            counts[roll_rarity(&tables, &mut rng).index()] += 1;
        }
        let common = counts[0] as f64 / 20_000.0;
        let legendary = counts[3] as f64 / 20_000.0;
        assert!((common - 0.60).abs() < 0.03, "common share {}", common);
        assert!((legendary - 0.03).abs() < 0.01, "legendary share {}", legendary);
    }

    #[test]
    fn test_candidate_trait_slots_match_rarity() {
        let tables = GameTables::standard();
        let mut rng = SmallRng::seed_from_u64(3);
        for id in 0..500 {
            let c = generate_candidate(id, Difficulty::Normal, &tables, &mut rng);
            let tier = tables.rarity(c.rarity);
            assert_eq!(c.traits.len(), tier.trait_slots);
            let mut unique = c.traits.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), c.traits.len(), "traits drawn without replacement");
            assert!(c.stats.coding >= tier.stat_min && c.stats.coding <= tier.stat_max);
            assert_eq!(c.hiring_cost, tier.hiring_cost);
            assert_eq!(c.level, 1);
        }
    }

    #[test]
    fn test_hiring_cost_scales_with_difficulty() {
        let tables = GameTables::standard();
        let mut rng_a = SmallRng::seed_from_u64(9);
        let mut rng_b = SmallRng::seed_from_u64(9);
        let easy = generate_candidate(1, Difficulty::Easy, &tables, &mut rng_a);
        let nightmare = generate_candidate(1, Difficulty::Nightmare, &tables, &mut rng_b);
        assert_eq!(easy.rarity, nightmare.rarity);
        assert!(easy.hiring_cost < nightmare.hiring_cost);
    }

    #[test]
    fn test_aggregate_sums_traits() {
        let tables = GameTables::standard();
        let team = vec![
            member(vec![Trait::AlgorithmExpert, Trait::Frugal]),
            member(vec![Trait::AlgorithmExpert, Trait::HardwareHacker, Trait::Scraper]),
        ];
        let mods = aggregate(&team, &tables);
        assert_eq!(mods.dimension_bonus(Dimension::Algorithm), 6);
        assert_eq!(mods.dimension_bonus(Dimension::Stability), 0);
        assert_eq!(mods.compute_bonus, 1);
        assert_eq!(mods.cost_reduction_pct, 5);
        assert_eq!(mods.data_bonus_pct, 20);
        assert_eq!(mods.training_bonus_pct, 10);
        assert_eq!(mods.entropy_mitigation, 1);
        assert!(!mods.hiring_pool_frozen);
    }

    #[test]
    fn test_aggregate_caps_cost_reduction() {
        let tables = GameTables::standard();
        let team: Vec<TeamMember> = (0..15).map(|_| member(vec![Trait::Frugal])).collect();
        assert_eq!(aggregate(&team, &tables).cost_reduction_pct, limits::MAX_COST_REDUCTION_PCT);
    }

    #[test]
    fn test_headhunter_freezes_pool() {
        let tables = GameTables::standard();
        let mods = aggregate(&[member(vec![Trait::Headhunter])], &tables);
        assert!(mods.hiring_pool_frozen);
    }

    #[test]
    fn test_empty_team_is_neutral() {
        let tables = GameTables::standard();
        assert_eq!(aggregate(&[], &tables), TeamModifiers::default());
        assert_eq!(total_salary(&[]), 0);
    }

    #[test]
    fn test_grant_experience_levels_up() {
        let mut m = member(vec![]);
        assert_eq!(m.grant_experience(250), 2);
        assert_eq!(m.level, 3);
        assert_eq!(m.experience, 50);
        assert_eq!(m.stats.coding, 60);
    }

    #[test]
    fn test_grant_experience_stops_at_max_level() {
        let mut m = member(vec![]);
        m.grant_experience(10_000);
        assert_eq!(m.level, limits::MAX_LEVEL);
        assert_eq!(m.experience, 0);
        assert_eq!(m.grant_experience(100), 0);
    }

    #[test]
    fn test_refresh_pool_assigns_unique_ids() {
        let tables = GameTables::standard();
        let mut state = create_game(Archetype::Startup, Difficulty::Normal, &tables);
        let mut rng = SmallRng::seed_from_u64(1);
        refresh_hiring_pool(&mut state, &tables, &mut rng);
        let first: Vec<u32> = state.hiring_pool.iter().map(|m| m.id).collect();
        refresh_hiring_pool(&mut state, &tables, &mut rng);
        assert_eq!(state.hiring_pool.len(), cadence::HIRING_POOL_SIZE);
        assert!(state.hiring_pool.iter().all(|m| !first.contains(&m.id)));
    }

    #[test]
    fn test_refresh_pool_skips_team_ids() {
        let tables = GameTables::standard();
        let mut state = create_game(Archetype::Startup, Difficulty::Normal, &tables);
        let mut veteran = member(vec![]);
        veteran.id = 1;
        state.team.push(veteran);
        state.next_member_id = 1;
        let mut rng = SmallRng::seed_from_u64(9);
        refresh_hiring_pool(&mut state, &tables, &mut rng);
        assert!(state.hiring_pool.iter().all(|m| m.id > 1));
        assert_eq!(state.next_member_id, 5);
    }

    #[test]
    fn test_take_and_release() {
        let tables = GameTables::standard();
        let mut state = create_game(Archetype::Startup, Difficulty::Normal, &tables);
        let mut rng = SmallRng::seed_from_u64(5);
        refresh_hiring_pool(&mut state, &tables, &mut rng);
        let id = state.hiring_pool[0].id;
        assert!(take_candidate(&mut state, id).is_some());
        assert_eq!(state.team.len(), 1);
        assert!(state.hiring_pool.iter().all(|m| m.id != id));
        assert!(take_candidate(&mut state, id).is_none());
        assert!(release_member(&mut state, id).is_some());
        assert!(state.team.is_empty());
    }
}
