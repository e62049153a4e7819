//! Effect descriptors and their application.
//!
//! An operation (or random event) carries an ordered list of [`Effect`]s.
//! Each variant holds only the fields it needs:
//!
//! - [`Effect::Fixed`]: a constant delta to one stat
//! - [`Effect::Ranged`]: a delta sampled uniformly from `[min, max]`
//! - [`Effect::Dimension`]: a delta to one fixed or player-chosen dimension
//! - [`Effect::RandomDimensions`]: `amount` added to `count` distinct random dimensions
//! - [`Effect::Gamble`]: exactly one of two effect lists, picked by a success roll
//! - [`Effect::Action`]: structural changes (equipment, team, meltdown)
//!
//! Positive gains are amplified by the live [`Modifiers`] (equipment,
//! team traits and stats, archetype ability). The state is normalized
//! after every single effect, so no out-of-range value is ever observable.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archetypes::Ability;
use crate::equipment::EquipmentTrack;
use crate::operations::{Category, Target};
use crate::state::{Dimension, GameState, Stat};
use crate::tables::GameTables;
use crate::team::{self, TeamModifiers};

/// Which dimension a [`Effect::Dimension`] hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionTarget {
    Fixed(Dimension),
    /// The dimension the player passed as the operation target.
    Chosen,
}

/// Two mutually exclusive outcome branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gamble {
    /// Probability of the success branch, within [0, 1].
    pub success_rate: f64,
    pub success: Vec<Effect>,
    pub failure: Vec<Effect>,
}

/// Structural effects that are not a plain numeric delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Convert up to N dirty data into golden data.
    CleanData(u32),
    UpgradeEquipment(EquipmentTrack),
    ResolveMeltdown,
    /// Grant experience to every team member.
    TeamExperience(u32),
    RefreshHiringPool,
    /// Move the targeted candidate into the team.
    HireCandidate,
    /// Remove the targeted member from the team.
    FireMember,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Fixed { stat: Stat, amount: i64 },
    Ranged { stat: Stat, min: i64, max: i64 },
    Dimension { target: DimensionTarget, amount: i32 },
    RandomDimensions { count: usize, amount: i32 },
    Gamble(Gamble),
    Action(Action),
}

impl Effect {
    pub fn fixed(stat: Stat, amount: i64) -> Self {
        Effect::Fixed { stat, amount }
    }

    pub fn ranged(stat: Stat, min: i64, max: i64) -> Self {
        Effect::Ranged { stat, min, max }
    }

    pub fn dimension(dim: Dimension, amount: i32) -> Self {
        Effect::Dimension {
            target: DimensionTarget::Fixed(dim),
            amount,
        }
    }

    pub fn gamble(success_rate: f64, success: Vec<Effect>, failure: Vec<Effect>) -> Self {
        Effect::Gamble(Gamble {
            success_rate,
            success,
            failure,
        })
    }

    /// Whether this effect (or any nested branch) needs a chosen dimension.
    pub fn needs_dimension_target(&self) -> bool {
        match self {
            Effect::Dimension {
                target: DimensionTarget::Chosen,
                ..
            } => true,
            Effect::Gamble(g) => g
                .success
                .iter()
                .chain(g.failure.iter())
                .any(Effect::needs_dimension_target),
            _ => false,
        }
    }
}

/// Live multipliers derived from the current state. Built fresh per call.
#[derive(Debug, Clone)]
pub struct Modifiers {
    pub team: TeamModifiers,
    pub gpu_pct: u32,
    pub network_pct: u32,
    pub cooling_pct: u32,
    pub ability: Ability,
}

impl Modifiers {
    pub fn for_state(state: &GameState, tables: &GameTables) -> Self {
        let bonus = |track| {
            tables
                .equipment(track)
                .bonus_percent(state.equipment.get(track).level)
        };
        Self {
            team: team::aggregate(&state.team, tables),
            gpu_pct: bonus(EquipmentTrack::Gpu),
            network_pct: bonus(EquipmentTrack::Network),
            cooling_pct: bonus(EquipmentTrack::Cooling),
            ability: tables.archetype(state.archetype).ability,
        }
    }

    /// Scale a stat delta for the category that produced it.
    pub fn scale(&self, stat: Stat, amount: i64, category: Option<Category>) -> i64 {
        let mut amount = amount;
        if amount > 0 {
            let pct = match category {
                Some(Category::Training) if stat.is_model_metric() => {
                    self.gpu_pct + self.team.training_bonus_pct
                }
                Some(Category::DataAcquisition) if stat.is_data() => {
                    self.network_pct + self.team.data_bonus_pct
                }
                _ => 0,
            };
            amount = amount * (100 + pct as i64) / 100;
        }
        if stat == Stat::Entropy {
            amount = self.ability.entropy_gain(amount);
        }
        amount
    }

    /// Scale a dimension delta: research bonus, then flat trait bonus.
    pub fn scale_dimension(&self, dim: Dimension, amount: i32) -> i32 {
        if amount <= 0 {
            return amount;
        }
        let scaled = amount * (100 + self.team.research_bonus_pct as i32) / 100;
        scaled + self.team.dimension_bonus(dim)
    }
}

/// Everything an effect needs besides the state and the RNG.
#[derive(Debug, Clone)]
pub struct EffectContext<'a> {
    pub tables: &'a GameTables,
    /// `None` for random events.
    pub category: Option<Category>,
    pub target: Option<Target>,
    pub modifiers: Modifiers,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        state: &GameState,
        tables: &'a GameTables,
        category: Option<Category>,
        target: Option<Target>,
    ) -> Self {
        Self {
            tables,
            category,
            target,
            modifiers: Modifiers::for_state(state, tables),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GambleOutcome {
    Success,
    Failure,
}

/// Human-readable record of what a batch of effects changed.
#[derive(Debug, Clone, Default)]
pub struct EffectReport {
    pub changes: Vec<String>,
    pub gambles: Vec<GambleOutcome>,
}

impl EffectReport {
    pub fn summary(&self) -> String {
        if self.changes.is_empty() {
            "no change".to_string()
        } else {
            self.changes.join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("a dimension target is required")]
    MissingDimension,
    #[error("a team member target is required")]
    MissingMember,
    #[error("no candidate with id {0} in the hiring pool")]
    UnknownCandidate(u32),
    #[error("no team member with id {0}")]
    UnknownMember(u32),
    #[error("{} is already at max level", .0.label())]
    EquipmentMaxed(EquipmentTrack),
}

/// Apply `effects` in order. Stops at the first failing effect; callers
/// work on a copy of the state and discard it on error.
pub fn apply_effects(
    state: &mut GameState,
    effects: &[Effect],
    ctx: &EffectContext<'_>,
    rng: &mut impl Rng,
    report: &mut EffectReport,
) -> Result<(), EffectError> {
    for effect in effects {
        apply_effect(state, effect, ctx, rng, report)?;
        state.normalize(ctx.tables);
    }
    Ok(())
}

fn apply_effect(
    state: &mut GameState,
    effect: &Effect,
    ctx: &EffectContext<'_>,
    rng: &mut impl Rng,
    report: &mut EffectReport,
) -> Result<(), EffectError> {
    match effect {
        Effect::Fixed { stat, amount } => {
            apply_stat(state, *stat, *amount, ctx, report);
        }
        Effect::Ranged { stat, min, max } => {
            let (lo, hi) = ((*min).min(*max), (*min).max(*max));
            let amount = rng.gen_range(lo..=hi);
            apply_stat(state, *stat, amount, ctx, report);
        }
        Effect::Dimension { target, amount } => {
            let dim = match target {
                DimensionTarget::Fixed(dim) => *dim,
                DimensionTarget::Chosen => match ctx.target {
                    Some(Target::Dimension(dim)) => dim,
                    _ => return Err(EffectError::MissingDimension),
                },
            };
            apply_dimension(state, dim, *amount, ctx, report);
        }
        Effect::RandomDimensions { count, amount } => {
            let picked: Vec<Dimension> = Dimension::ALL
                .choose_multiple(rng, (*count).min(Dimension::ALL.len()))
                .copied()
                .collect();
            for dim in picked {
                apply_dimension(state, dim, *amount, ctx, report);
            }
        }
        Effect::Gamble(gamble) => {
            let won = rng.gen_bool(gamble.success_rate.clamp(0.0, 1.0));
            let (outcome, branch) = if won {
                (GambleOutcome::Success, &gamble.success)
            } else {
                (GambleOutcome::Failure, &gamble.failure)
            };
            report.gambles.push(outcome);
            report.changes.push(if won { "gamble paid off".into() } else { "gamble failed".into() });
            apply_effects(state, branch, ctx, rng, report)?;
        }
        Effect::Action(action) => apply_action(state, *action, ctx, rng, report)?,
    }
    Ok(())
}

fn apply_stat(
    state: &mut GameState,
    stat: Stat,
    amount: i64,
    ctx: &EffectContext<'_>,
    report: &mut EffectReport,
) {
    let scaled = ctx.modifiers.scale(stat, amount, ctx.category);
    let before = state.stat(stat);
    state.adjust(stat, scaled);
    let actual = state.stat(stat) - before;
    report.changes.push(format!("{} {:+}", stat.label(), actual));
}

fn apply_dimension(
    state: &mut GameState,
    dim: Dimension,
    amount: i32,
    ctx: &EffectContext<'_>,
    report: &mut EffectReport,
) {
    let scaled = ctx.modifiers.scale_dimension(dim, amount);
    let before = state.dimensions.get(dim);
    state.dimensions.add(dim, scaled as i64);
    let actual = state.dimensions.get(dim) - before;
    report.changes.push(format!("{} {:+}", dim.label(), actual));
}

fn apply_action(
    state: &mut GameState,
    action: Action,
    ctx: &EffectContext<'_>,
    rng: &mut impl Rng,
    report: &mut EffectReport,
) -> Result<(), EffectError> {
    match action {
        Action::CleanData(amount) => {
            let moved = amount.min(state.resources.dirty_data);
            state.resources.dirty_data -= moved;
            state.resources.golden_data += moved;
            report.changes.push(format!("cleaned {} data", moved));
        }
        Action::UpgradeEquipment(track) => {
            let config = ctx.tables.equipment(track);
            let level = state
                .equipment
                .upgrade(config)
                .ok_or(EffectError::EquipmentMaxed(track))?;
            report.changes.push(format!("{} upgraded to level {}", track.label(), level));
        }
        Action::ResolveMeltdown => {
            state.risks.server_meltdown = false;
            state.risks.meltdown_turns = 0;
            report.changes.push("meltdown resolved".into());
        }
        Action::TeamExperience(xp) => {
            let levels: u32 = state.team.iter_mut().map(|m| m.grant_experience(xp)).sum();
            report
                .changes
                .push(format!("team +{} xp ({} level-ups)", xp, levels));
        }
        Action::RefreshHiringPool => {
            team::refresh_hiring_pool(state, ctx.tables, rng);
            report.changes.push("hiring pool refreshed".into());
        }
        Action::HireCandidate => {
            let id = member_target(ctx)?;
            let hired = team::take_candidate(state, id).ok_or(EffectError::UnknownCandidate(id))?;
            report.changes.push(format!("hired {}", hired.name));
        }
        Action::FireMember => {
            let id = member_target(ctx)?;
            let fired = team::release_member(state, id).ok_or(EffectError::UnknownMember(id))?;
            report.changes.push(format!("released {}", fired.name));
        }
    }
    Ok(())
}

fn member_target(ctx: &EffectContext<'_>) -> Result<u32, EffectError> {
    match ctx.target {
        Some(Target::Member(id)) => Ok(id),
        _ => Err(EffectError::MissingMember),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::Archetype;
    use crate::difficulty::Difficulty;
    use crate::state::create_game;
    use crate::team::{MemberStats, Rarity, TeamMember, Trait};
    use rand::{rngs::SmallRng, SeedableRng};

    fn setup(archetype: Archetype) -> (GameState, GameTables, SmallRng) {
        let tables = GameTables::standard();
        let state = create_game(archetype, Difficulty::Normal, &tables);
        (state, tables, SmallRng::seed_from_u64(17))
    }

    fn run(
        state: &mut GameState,
        tables: &GameTables,
        rng: &mut SmallRng,
        effects: &[Effect],
        category: Option<Category>,
        target: Option<Target>,
    ) -> Result<EffectReport, EffectError> {
        let ctx = EffectContext::new(state, tables, category, target);
        let mut report = EffectReport::default();
        apply_effects(state, effects, &ctx, rng, &mut report)?;
        Ok(report)
    }

    #[test]
    fn test_fixed_and_ranged() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let acc = state.metrics.accuracy;
        run(&mut state, &tables, &mut rng, &[Effect::fixed(Stat::Accuracy, 5)], None, None).unwrap();
        assert_eq!(state.metrics.accuracy, acc + 5);

        for _ in 0..50 {
            let before = state.resources.budget;
            run(&mut state, &tables, &mut rng, &[Effect::ranged(Stat::Budget, 100, 200)], None, None)
                .unwrap();
            let delta = state.resources.budget - before;
            assert!((100..=200).contains(&delta));
        }
    }

    #[test]
    fn test_ranged_with_reversed_bounds() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let before = state.resources.budget;
        run(&mut state, &tables, &mut rng, &[Effect::ranged(Stat::Budget, 20, 10)], None, None).unwrap();
        assert!((10..=20).contains(&(state.resources.budget - before)));
    }

    #[test]
    fn test_gpu_amplifies_training_only() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        state.equipment.gpu.level = 4;
        let acc = state.metrics.accuracy;
        run(&mut state, &tables, &mut rng, &[Effect::fixed(Stat::Accuracy, 20)], Some(Category::Training), None)
            .unwrap();
        assert_eq!(state.metrics.accuracy, acc + 27);

        let acc = state.metrics.accuracy;
        run(&mut state, &tables, &mut rng, &[Effect::fixed(Stat::Accuracy, 20)], Some(Category::Maintenance), None)
            .unwrap();
        assert_eq!(state.metrics.accuracy, acc + 20);
    }

    #[test]
    fn test_peer_review_dampens_entropy() {
        let (mut state, tables, mut rng) = setup(Archetype::Academic);
        let before = state.metrics.entropy;
        run(&mut state, &tables, &mut rng, &[Effect::fixed(Stat::Entropy, 8)], None, None).unwrap();
        assert_eq!(state.metrics.entropy, before + 6);
    }

    #[test]
    fn test_chosen_dimension_requires_target() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let effect = Effect::Dimension { target: DimensionTarget::Chosen, amount: 5 };
        let err = run(&mut state, &tables, &mut rng, &[effect.clone()], None, None).unwrap_err();
        assert_eq!(err, EffectError::MissingDimension);

        run(&mut state, &tables, &mut rng, &[effect], None, Some(Target::Dimension(Dimension::Stability)))
            .unwrap();
        assert_eq!(state.dimensions.stability, 25);
    }

    #[test]
    fn test_trait_bonus_on_dimension_gain() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        state.team.push(TeamMember {
            id: 99,
            name: "Sam".into(),
            rarity: Rarity::Rare,
            stats: MemberStats { coding: 0, research: 0, ops: 0 },
            traits: vec![Trait::SiteReliability],
            level: 1,
            experience: 0,
            hiring_cost: 0,
            salary: 0,
        });
        run(&mut state, &tables, &mut rng, &[Effect::dimension(Dimension::Stability, 5)], None, None).unwrap();
        assert_eq!(state.dimensions.stability, 28);
        // losses are not amplified
        run(&mut state, &tables, &mut rng, &[Effect::dimension(Dimension::Stability, -5)], None, None).unwrap();
        assert_eq!(state.dimensions.stability, 23);
    }

    #[test]
    fn test_random_dimensions_distinct() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        for _ in 0..100 {
            let before = state.dimensions;
            let effect = Effect::RandomDimensions { count: 2, amount: 1 };
            run(&mut state, &tables, &mut rng, &[effect], None, None).unwrap();
            let raised = Dimension::ALL
                .iter()
                .filter(|d| state.dimensions.get(**d) != before.get(**d))
                .count();
            assert!(raised <= 2);
            let total: i32 = Dimension::ALL
                .iter()
                .map(|d| state.dimensions.get(*d) - before.get(*d))
                .sum();
            assert!(total <= 2);
        }
    }

    #[test]
    fn test_gamble_fires_exactly_one_branch() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let gamble = Effect::gamble(
            0.5,
            vec![Effect::fixed(Stat::Budget, 1)],
            vec![Effect::fixed(Stat::Budget, 1_000)],
        );
        for _ in 0..200 {
            let before = state.resources.budget;
            let report = run(&mut state, &tables, &mut rng, &[gamble.clone()], None, None).unwrap();
            let delta = state.resources.budget - before;
            assert_eq!(report.gambles.len(), 1);
            match report.gambles[0] {
                GambleOutcome::Success => assert_eq!(delta, 1),
                GambleOutcome::Failure => assert_eq!(delta, 1_000),
            }
        }
    }

    #[test]
    fn test_gamble_rate_out_of_range_is_clamped() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let sure = Effect::gamble(1.7, vec![Effect::fixed(Stat::Reputation, 1)], vec![]);
        let report = run(&mut state, &tables, &mut rng, &[sure], None, None).unwrap();
        assert_eq!(report.gambles, vec![GambleOutcome::Success]);
    }

    #[test]
    fn test_clean_data_moves_dirty_to_golden() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let (dirty, golden) = (state.resources.dirty_data, state.resources.golden_data);
        run(&mut state, &tables, &mut rng, &[Effect::Action(Action::CleanData(1_000))], None, None).unwrap();
        assert_eq!(state.resources.dirty_data, 0);
        assert_eq!(state.resources.golden_data, golden + dirty);
    }

    #[test]
    fn test_storage_upgrade_raises_capacity() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let cap = state.resources.data_capacity;
        run(
            &mut state,
            &tables,
            &mut rng,
            &[Effect::Action(Action::UpgradeEquipment(EquipmentTrack::Storage))],
            None,
            None,
        )
        .unwrap();
        assert_eq!(state.resources.data_capacity, cap * 125 / 100);
    }

    #[test]
    fn test_hire_unknown_candidate_errors() {
        let (mut state, tables, mut rng) = setup(Archetype::Startup);
        let err = run(
            &mut state,
            &tables,
            &mut rng,
            &[Effect::Action(Action::HireCandidate)],
            None,
            Some(Target::Member(404)),
        )
        .unwrap_err();
        assert_eq!(err, EffectError::UnknownCandidate(404));
    }

    #[test]
    fn test_needs_dimension_target_through_gamble() {
        let nested = Effect::gamble(
            0.5,
            vec![Effect::Dimension { target: DimensionTarget::Chosen, amount: 3 }],
            vec![],
        );
        assert!(nested.needs_dimension_target());
        assert!(!Effect::fixed(Stat::Budget, 1).needs_dimension_target());
    }
}
