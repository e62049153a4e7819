//! Exam evaluator.
//!
//! Runs from the turn engine whenever the exam countdown reaches zero.
//!
//! ```text
//! finalReward = floor(baseTraffic × fitMult × stability × (1 + dimBonus)
//!                     / difficultyLevel × abilityMult)
//!
//! fitMult         = fitScore / 50
//! stability       = (100 − entropy) / 100
//! dimBonus        = (mean of focus dimensions − 50) / 100
//! difficultyLevel = (1 + growth) ^ examsPassed
//! ```
//!
//! An exam passes when the reward reaches the difficulty's pass bar and
//! the active dimension threshold (if any) is met. Evaluation is pure;
//! [`apply_result`] commits the outcome.

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{gauges, upkeep};
use crate::state::{Dimension, GameState, Stat};
use crate::tables::GameTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    BenchmarkGauntlet,
    DataDeluge,
    LaunchDay,
    RedTeamAudit,
    OpenBeta,
}

impl ScenarioKind {
    pub fn id(self) -> &'static str {
        match self {
            ScenarioKind::BenchmarkGauntlet => "benchmark_gauntlet",
            ScenarioKind::DataDeluge => "data_deluge",
            ScenarioKind::LaunchDay => "launch_day",
            ScenarioKind::RedTeamAudit => "red_team_audit",
            ScenarioKind::OpenBeta => "open_beta",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamScenario {
    pub kind: ScenarioKind,
    pub name: String,
    pub base_traffic: u32,
    /// Never empty.
    pub focus_dimensions: Vec<Dimension>,
}

pub fn exam_scenarios() -> Vec<ExamScenario> {
    use Dimension::*;
    let scenario = |kind, name: &str, base_traffic, focus: &[Dimension]| ExamScenario {
        kind,
        name: name.to_string(),
        base_traffic,
        focus_dimensions: focus.to_vec(),
    };
    vec![
        scenario(ScenarioKind::BenchmarkGauntlet, "Benchmark Gauntlet", 8000, &[Algorithm, Stability]),
        scenario(ScenarioKind::DataDeluge, "Data Deluge", 7000, &[DataProcessing]),
        scenario(ScenarioKind::LaunchDay, "Launch Day", 10_000, &[UserExperience, Stability]),
        scenario(
            ScenarioKind::RedTeamAudit,
            "Red Team Audit",
            9000,
            &[Stability, Algorithm, DataProcessing],
        ),
        scenario(ScenarioKind::OpenBeta, "Open Beta", 8500, &[UserExperience, DataProcessing]),
    ]
}

/// Outcome of one exam, kept for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub scenario: ScenarioKind,
    pub scenario_name: String,
    /// 1-based number of this exam attempt within the pass streak.
    pub exam_number: u32,
    pub fit_score_multiplier: f64,
    pub stability_coefficient: f64,
    pub dimension_bonus: f64,
    pub difficulty_level: f64,
    pub meets_threshold: bool,
    pub final_reward: i64,
    pub passed: bool,
    pub budget_change: i64,
    pub reputation_change: i32,
}

/// Evaluate `scenario` against `state` without mutating anything.
pub fn evaluate(state: &GameState, scenario: &ExamScenario, tables: &GameTables) -> ExamResult {
    let diff = tables.difficulty(state.difficulty);
    let ability = tables.archetype(state.archetype).ability;
    let exams_passed = state.progress.exams_passed;

    let fit_score_multiplier = state.metrics.fit_score as f64 / 50.0;
    let stability_coefficient = (gauges::MAX - state.metrics.entropy) as f64 / 100.0;
    let focus = state.dimensions.average_of(&scenario.focus_dimensions);
    let dimension_bonus = (focus - gauges::DIMENSION_BASELINE) / 100.0;
    let difficulty_level = diff.difficulty_level(exams_passed);

    let meets_threshold = diff
        .active_threshold(exams_passed)
        .map_or(true, |t| state.dimensions.count_at_least(t.value) >= t.dim_count);

    let raw = scenario.base_traffic as f64
        * fit_score_multiplier
        * stability_coefficient
        * (1.0 + dimension_bonus)
        / difficulty_level
        * ability.exam_reward_multiplier();
    // guard against 4479.9999 style float artifacts
    let final_reward = (raw + 1e-9).floor().max(0.0) as i64;
    let passed = meets_threshold && final_reward >= diff.exam_pass_bar;

    let (budget_change, reputation_change) = if passed {
        (final_reward, upkeep::EXAM_PASS_REPUTATION)
    } else {
        (-diff.exam_fail_penalty, -diff.exam_fail_reputation_penalty)
    };

    ExamResult {
        scenario: scenario.kind,
        scenario_name: scenario.name.clone(),
        exam_number: exams_passed + 1,
        fit_score_multiplier,
        stability_coefficient,
        dimension_bonus,
        difficulty_level,
        meets_threshold,
        final_reward,
        passed,
        budget_change,
        reputation_change,
    }
}

/// Commit an exam outcome to the state.
pub fn apply_result(state: &mut GameState, result: &ExamResult) {
    state.adjust(Stat::Budget, result.budget_change);
    state.adjust(Stat::Reputation, result.reputation_change as i64);
    if result.passed {
        state.progress.exams_passed += 1;
    }
}

/// Uniform pick from the scenario table.
pub fn pick_scenario<'a>(scenarios: &'a [ExamScenario], rng: &mut impl Rng) -> Option<&'a ExamScenario> {
    scenarios.choose(rng)
}

/// Pick a scenario, evaluate it and commit the outcome.
pub fn run_exam(state: &mut GameState, tables: &GameTables, rng: &mut impl Rng) -> Option<ExamResult> {
    let scenario = pick_scenario(&tables.scenarios, rng)?;
    let result = evaluate(state, scenario, tables);
    apply_result(state, &result);
    info!(
        "exam {} ({}): reward {} threshold {} -> {}",
        result.exam_number,
        scenario.kind.id(),
        result.final_reward,
        result.meets_threshold,
        if result.passed { "passed" } else { "failed" }
    );
    Some(result)
}

/// One-line summary for the log.
pub fn describe(result: &ExamResult) -> String {
    if result.passed {
        format!(
            "Exam {} ({}) passed: +{} budget, reputation +{}",
            result.exam_number, result.scenario_name, result.final_reward, result.reputation_change
        )
    } else if !result.meets_threshold {
        format!(
            "Exam {} ({}) failed the dimension gate: {} budget",
            result.exam_number, result.scenario_name, result.budget_change
        )
    } else {
        format!(
            "Exam {} ({}) failed with reward {}: {} budget",
            result.exam_number, result.scenario_name, result.final_reward, result.budget_change
        )
    }
}
