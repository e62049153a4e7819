//! Operation catalog: every player action, its cost, effects and gate.
//!
//! Operations are a closed set of [`OperationId`] variants. The static
//! data for each one ([`OperationDef`]) lives in the [`OperationCatalog`],
//! grouped into exactly seven [`Category`] arrays; an operation belongs to
//! one group and only one.
//!
//! Applying an operation never mutates the caller's state. The state is
//! cloned, the cost deducted, the effects applied in order, and the result
//! handed back as a [`Transition`]. An ineligible call returns
//! [`EngineError::IneligibleOperation`] and leaves nothing behind.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::cadence;
use crate::effects::{apply_effects, Action, DimensionTarget, Effect, EffectContext, EffectReport};
use crate::equipment::EquipmentTrack;
use crate::error::EngineError;
use crate::exam::ExamResult;
use crate::log::{LogEntry, LogKind};
use crate::state::{Dimension, GameState, Stat};
use crate::tables::GameTables;
use crate::team;
use crate::turn::check_immediate_defeat;

// ── Categories ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DataAcquisition,
    Training,
    Maintenance,
    DimensionFocus,
    Premium,
    TeamManagement,
    SideJob,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::DataAcquisition,
        Category::Training,
        Category::Maintenance,
        Category::DimensionFocus,
        Category::Premium,
        Category::TeamManagement,
        Category::SideJob,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Category::DataAcquisition => "data_acquisition",
            Category::Training => "training",
            Category::Maintenance => "maintenance",
            Category::DimensionFocus => "dimension_focus",
            Category::Premium => "premium",
            Category::TeamManagement => "team_management",
            Category::SideJob => "side_job",
        }
    }
}

// ── Operation ids ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    // data acquisition
    ScrapeWeb,
    BuyDataset,
    CrowdsourceLabels,
    SyntheticData,
    // training
    BasicTraining,
    FineTune,
    SpeedOptimization,
    CreativeSampling,
    YoloTraining,
    // maintenance
    CleanData,
    RefactorCode,
    LegalReview,
    EmergencyPatch,
    // dimension focus
    AlgorithmResearch,
    DataPipeline,
    StressTesting,
    UserStudy,
    FocusDimension,
    Hackathon,
    // premium
    Consultant,
    ArchitectureOverhaul,
    UpgradeGpu,
    UpgradeStorage,
    UpgradeNetwork,
    UpgradeCooling,
    // team management
    HireCandidate,
    FireMember,
    TeamBuilding,
    // side jobs
    FreelanceGig,
    ViralMarketing,
    KaggleCompetition,
}

impl OperationId {
    pub const ALL: [OperationId; 31] = [
        OperationId::ScrapeWeb,
        OperationId::BuyDataset,
        OperationId::CrowdsourceLabels,
        OperationId::SyntheticData,
        OperationId::BasicTraining,
        OperationId::FineTune,
        OperationId::SpeedOptimization,
        OperationId::CreativeSampling,
        OperationId::YoloTraining,
        OperationId::CleanData,
        OperationId::RefactorCode,
        OperationId::LegalReview,
        OperationId::EmergencyPatch,
        OperationId::AlgorithmResearch,
        OperationId::DataPipeline,
        OperationId::StressTesting,
        OperationId::UserStudy,
        OperationId::FocusDimension,
        OperationId::Hackathon,
        OperationId::Consultant,
        OperationId::ArchitectureOverhaul,
        OperationId::UpgradeGpu,
        OperationId::UpgradeStorage,
        OperationId::UpgradeNetwork,
        OperationId::UpgradeCooling,
        OperationId::HireCandidate,
        OperationId::FireMember,
        OperationId::TeamBuilding,
        OperationId::FreelanceGig,
        OperationId::ViralMarketing,
        OperationId::KaggleCompetition,
    ];

    pub fn id(self) -> &'static str {
        match self {
            OperationId::ScrapeWeb => "scrape_web",
            OperationId::BuyDataset => "buy_dataset",
            OperationId::CrowdsourceLabels => "crowdsource_labels",
            OperationId::SyntheticData => "synthetic_data",
            OperationId::BasicTraining => "basic_training",
            OperationId::FineTune => "fine_tune",
            OperationId::SpeedOptimization => "speed_optimization",
            OperationId::CreativeSampling => "creative_sampling",
            OperationId::YoloTraining => "yolo_training",
            OperationId::CleanData => "clean_data",
            OperationId::RefactorCode => "refactor_code",
            OperationId::LegalReview => "legal_review",
            OperationId::EmergencyPatch => "emergency_patch",
            OperationId::AlgorithmResearch => "algorithm_research",
            OperationId::DataPipeline => "data_pipeline",
            OperationId::StressTesting => "stress_testing",
            OperationId::UserStudy => "user_study",
            OperationId::FocusDimension => "focus_dimension",
            OperationId::Hackathon => "hackathon",
            OperationId::Consultant => "consultant",
            OperationId::ArchitectureOverhaul => "architecture_overhaul",
            OperationId::UpgradeGpu => "upgrade_gpu",
            OperationId::UpgradeStorage => "upgrade_storage",
            OperationId::UpgradeNetwork => "upgrade_network",
            OperationId::UpgradeCooling => "upgrade_cooling",
            OperationId::HireCandidate => "hire_candidate",
            OperationId::FireMember => "fire_member",
            OperationId::TeamBuilding => "team_building",
            OperationId::FreelanceGig => "freelance_gig",
            OperationId::ViralMarketing => "viral_marketing",
            OperationId::KaggleCompetition => "kaggle_competition",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.id() == id)
    }
}

// ── Definitions ────────────────────────────────────────────────────

/// Resources deducted before effects apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub budget: u64,
    pub compute_points: u32,
    pub dirty_data: u32,
    pub golden_data: u32,
}

impl Cost {
    pub const FREE: Cost = Cost {
        budget: 0,
        compute_points: 0,
        dirty_data: 0,
        golden_data: 0,
    };
}

/// How the budget part of a cost is derived at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostScaling {
    /// Catalog budget, reduced by the team cost reduction.
    Flat,
    /// Track's upgrade cost at its current level, reduced by the team cost reduction.
    EquipmentLevel(EquipmentTrack),
    /// Targeted candidate's hiring cost.
    CandidateHiringCost,
    /// Targeted member's salary, paid as severance.
    MemberSeverance,
}

/// Preconditions beyond affordability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    DimensionTarget,
    CandidateTarget,
    MemberTarget,
    Meltdown,
    EquipmentBelowMax(EquipmentTrack),
    TeamNotEmpty,
}

/// What the player aims a targeted operation at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    Dimension(Dimension),
    /// A candidate id (hiring) or a team member id (firing).
    Member(u32),
}

#[derive(Debug, Clone)]
pub struct OperationDef {
    pub id: OperationId,
    pub category: Category,
    pub name: String,
    pub description: String,
    pub cost: Cost,
    pub scaling: CostScaling,
    pub effects: Vec<Effect>,
    pub requirements: Vec<Requirement>,
}

impl OperationDef {
    fn new(id: OperationId, category: Category, name: &str, description: &str, cost: Cost) -> Self {
        Self {
            id,
            category,
            name: name.to_string(),
            description: description.to_string(),
            cost,
            scaling: CostScaling::Flat,
            effects: Vec::new(),
            requirements: Vec::new(),
        }
    }

    fn effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }

    fn scaled(mut self, scaling: CostScaling) -> Self {
        self.scaling = scaling;
        self
    }

    fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }
}

/// One category and the operations filed under it.
#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub category: Category,
    pub operations: Vec<OperationDef>,
}

/// The full registry, organized as seven category arrays.
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    pub groups: Vec<CategoryGroup>,
}

impl OperationCatalog {
    pub fn standard() -> Self {
        Self {
            groups: vec![
                CategoryGroup { category: Category::DataAcquisition, operations: data_acquisition_ops() },
                CategoryGroup { category: Category::Training, operations: training_ops() },
                CategoryGroup { category: Category::Maintenance, operations: maintenance_ops() },
                CategoryGroup { category: Category::DimensionFocus, operations: dimension_focus_ops() },
                CategoryGroup { category: Category::Premium, operations: premium_ops() },
                CategoryGroup { category: Category::TeamManagement, operations: team_ops() },
                CategoryGroup { category: Category::SideJob, operations: side_job_ops() },
            ],
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &OperationDef> {
        self.groups.iter().flat_map(|g| g.operations.iter())
    }

    pub fn get(&self, id: OperationId) -> Option<&OperationDef> {
        self.all().find(|op| op.id == id)
    }

    /// Operations filed under `category` (empty if the group is missing).
    pub fn category(&self, category: Category) -> &[OperationDef] {
        self.groups
            .iter()
            .find(|g| g.category == category)
            .map(|g| g.operations.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn data_acquisition_ops() -> Vec<OperationDef> {
    use OperationId::*;
    let cat = Category::DataAcquisition;
    vec![
        OperationDef::new(ScrapeWeb, cat, "Scrape the Web", "Free data of questionable provenance.",
            Cost { compute_points: 1, ..Cost::FREE })
            .effects(vec![
                Effect::ranged(Stat::DirtyData, 20, 35),
                Effect::fixed(Stat::LegalRisk, 4),
            ]),
        OperationDef::new(BuyDataset, cat, "Buy Dataset", "A licensed, curated corpus.",
            Cost { budget: 2000, ..Cost::FREE })
            .effects(vec![Effect::fixed(Stat::GoldenData, 15)]),
        OperationDef::new(CrowdsourceLabels, cat, "Crowdsource Labels", "Pay the crowd to label a batch.",
            Cost { budget: 800, compute_points: 1, ..Cost::FREE })
            .effects(vec![
                Effect::ranged(Stat::GoldenData, 5, 10),
                Effect::fixed(Stat::DirtyData, 5),
            ]),
        OperationDef::new(SyntheticData, cat, "Synthetic Data", "Let the model feed itself.",
            Cost { compute_points: 2, ..Cost::FREE })
            .effects(vec![
                Effect::fixed(Stat::DirtyData, 10),
                Effect::fixed(Stat::GoldenData, 5),
                Effect::fixed(Stat::Entropy, 2),
            ]),
    ]
}

fn training_ops() -> Vec<OperationDef> {
    use OperationId::*;
    let cat = Category::Training;
    vec![
        OperationDef::new(BasicTraining, cat, "Basic Training", "A plain epoch over golden data.",
            Cost { compute_points: 2, golden_data: 5, ..Cost::FREE })
            .effects(vec![
                Effect::ranged(Stat::Accuracy, 3, 6),
                Effect::fixed(Stat::Entropy, 2),
            ]),
        OperationDef::new(FineTune, cat, "Fine-Tune", "Careful tuning that also lifts the ceiling.",
            Cost { compute_points: 2, golden_data: 10, ..Cost::FREE })
            .effects(vec![
                Effect::fixed(Stat::Accuracy, 5),
                Effect::fixed(Stat::Robustness, 3),
                Effect::fixed(Stat::FitScoreCap, 3),
                Effect::fixed(Stat::Entropy, 2),
            ]),
        OperationDef::new(SpeedOptimization, cat, "Speed Optimization", "Quantize, prune, cache.",
            Cost { compute_points: 2, ..Cost::FREE })
            .effects(vec![
                Effect::fixed(Stat::Speed, 6),
                Effect::fixed(Stat::Entropy, 3),
            ]),
        OperationDef::new(CreativeSampling, cat, "Creative Sampling", "Crank up the temperature.",
            Cost { compute_points: 2, dirty_data: 10, ..Cost::FREE })
            .effects(vec![
                Effect::fixed(Stat::Creativity, 6),
                Effect::fixed(Stat::Entropy, 3),
            ]),
        OperationDef::new(YoloTraining, cat, "YOLO Training", "Train on everything. What could go wrong?",
            Cost { compute_points: 3, dirty_data: 15, ..Cost::FREE })
            .effects(vec![Effect::gamble(
                0.4,
                vec![
                    Effect::fixed(Stat::Accuracy, 12),
                    Effect::fixed(Stat::Speed, 6),
                    Effect::fixed(Stat::Creativity, 6),
                ],
                vec![
                    Effect::fixed(Stat::Entropy, 10),
                    Effect::fixed(Stat::Robustness, -5),
                ],
            )]),
    ]
}

fn maintenance_ops() -> Vec<OperationDef> {
    use OperationId::*;
    let cat = Category::Maintenance;
    vec![
        OperationDef::new(CleanData, cat, "Clean Data", "Turn dirty data into golden data.",
            Cost { compute_points: 1, ..Cost::FREE })
            .effects(vec![Effect::Action(Action::CleanData(20))]),
        OperationDef::new(RefactorCode, cat, "Refactor Code", "Pay down technical debt.",
            Cost { compute_points: 2, ..Cost::FREE })
            .effects(vec![
                Effect::fixed(Stat::Entropy, -10),
                Effect::dimension(Dimension::Stability, 1),
            ]),
        OperationDef::new(LegalReview, cat, "Legal Review", "Lawyers read the terms of service.",
            Cost { budget: 1500, ..Cost::FREE })
            .effects(vec![Effect::fixed(Stat::LegalRisk, -15)]),
        OperationDef::new(EmergencyPatch, cat, "Emergency Patch", "Bring the servers back up.",
            Cost { budget: 3000, compute_points: 2, ..Cost::FREE })
            .requires(Requirement::Meltdown)
            .effects(vec![
                Effect::Action(Action::ResolveMeltdown),
                Effect::fixed(Stat::Entropy, -15),
            ]),
    ]
}

fn dimension_focus_ops() -> Vec<OperationDef> {
    use OperationId::*;
    let cat = Category::DimensionFocus;
    vec![
        OperationDef::new(AlgorithmResearch, cat, "Algorithm Research", "Read papers, write papers.",
            Cost { compute_points: 2, ..Cost::FREE })
            .effects(vec![
                Effect::dimension(Dimension::Algorithm, 5),
                Effect::fixed(Stat::Entropy, 1),
            ]),
        OperationDef::new(DataPipeline, cat, "Data Pipeline", "Build proper ingestion.",
            Cost { compute_points: 2, dirty_data: 5, ..Cost::FREE })
            .effects(vec![Effect::dimension(Dimension::DataProcessing, 5)]),
        OperationDef::new(StressTesting, cat, "Stress Testing", "Hammer the model until it breaks.",
            Cost { compute_points: 2, ..Cost::FREE })
            .effects(vec![
                Effect::dimension(Dimension::Stability, 5),
                Effect::fixed(Stat::Robustness, 1),
            ]),
        OperationDef::new(UserStudy, cat, "User Study", "Watch real people use the product.",
            Cost { budget: 1000, compute_points: 1, ..Cost::FREE })
            .effects(vec![Effect::dimension(Dimension::UserExperience, 5)]),
        OperationDef::new(FocusDimension, cat, "Focused Sprint", "Pour a sprint into one dimension.",
            Cost { compute_points: 3, ..Cost::FREE })
            .requires(Requirement::DimensionTarget)
            .effects(vec![Effect::Dimension { target: DimensionTarget::Chosen, amount: 8 }]),
        OperationDef::new(Hackathon, cat, "Hackathon", "Forty-eight hours, two random breakthroughs.",
            Cost { budget: 500, compute_points: 3, ..Cost::FREE })
            .effects(vec![
                Effect::RandomDimensions { count: 2, amount: 4 },
                Effect::fixed(Stat::Entropy, 3),
            ]),
    ]
}

fn premium_ops() -> Vec<OperationDef> {
    use OperationId::*;
    let cat = Category::Premium;
    let upgrade = |id, track: EquipmentTrack, name: &str| {
        OperationDef::new(id, cat, name, "Raise the track one level.", Cost::FREE)
            .scaled(CostScaling::EquipmentLevel(track))
            .requires(Requirement::EquipmentBelowMax(track))
            .effects(vec![Effect::Action(Action::UpgradeEquipment(track))])
    };
    vec![
        OperationDef::new(Consultant, cat, "Hire Consultants", "Expensive advice on three fronts.",
            Cost { budget: 5000, ..Cost::FREE })
            .effects(vec![Effect::RandomDimensions { count: 3, amount: 3 }]),
        OperationDef::new(ArchitectureOverhaul, cat, "Architecture Overhaul", "Raise the model's ceiling.",
            Cost { budget: 6000, compute_points: 2, ..Cost::FREE })
            .effects(vec![
                Effect::fixed(Stat::FitScoreCap, 10),
                Effect::fixed(Stat::Entropy, -5),
            ]),
        upgrade(UpgradeGpu, EquipmentTrack::Gpu, "Upgrade GPUs"),
        upgrade(UpgradeStorage, EquipmentTrack::Storage, "Upgrade Storage"),
        upgrade(UpgradeNetwork, EquipmentTrack::Network, "Upgrade Network"),
        upgrade(UpgradeCooling, EquipmentTrack::Cooling, "Upgrade Cooling"),
    ]
}

fn team_ops() -> Vec<OperationDef> {
    use OperationId::*;
    let cat = Category::TeamManagement;
    vec![
        OperationDef::new(HireCandidate, cat, "Hire Candidate", "Bring a candidate onto the team.", Cost::FREE)
            .scaled(CostScaling::CandidateHiringCost)
            .requires(Requirement::CandidateTarget)
            .effects(vec![Effect::Action(Action::HireCandidate)]),
        OperationDef::new(FireMember, cat, "Let Go", "Release a member with one salary as severance.", Cost::FREE)
            .scaled(CostScaling::MemberSeverance)
            .requires(Requirement::MemberTarget)
            .effects(vec![
                Effect::Action(Action::FireMember),
                Effect::fixed(Stat::Reputation, -1),
            ]),
        OperationDef::new(TeamBuilding, cat, "Team Building", "Offsite, pizza, and shared experience.",
            Cost { budget: 1000, ..Cost::FREE })
            .requires(Requirement::TeamNotEmpty)
            .effects(vec![
                Effect::Action(Action::TeamExperience(40)),
                Effect::fixed(Stat::Entropy, -2),
            ]),
    ]
}

fn side_job_ops() -> Vec<OperationDef> {
    use OperationId::*;
    let cat = Category::SideJob;
    vec![
        OperationDef::new(FreelanceGig, cat, "Freelance Gig", "Rent the GPUs out for an afternoon.",
            Cost { compute_points: 1, ..Cost::FREE })
            .effects(vec![
                Effect::ranged(Stat::Budget, 1500, 2500),
                Effect::fixed(Stat::Entropy, 1),
            ]),
        OperationDef::new(ViralMarketing, cat, "Viral Marketing", "A demo that might trend.",
            Cost { compute_points: 1, ..Cost::FREE })
            .effects(vec![Effect::gamble(
                0.5,
                vec![Effect::fixed(Stat::Reputation, 8), Effect::fixed(Stat::Budget, 3000)],
                vec![Effect::fixed(Stat::Reputation, -5), Effect::fixed(Stat::LegalRisk, 5)],
            )]),
        OperationDef::new(KaggleCompetition, cat, "Kaggle Competition", "Prize money for the top of the board.",
            Cost { compute_points: 2, golden_data: 5, ..Cost::FREE })
            .effects(vec![Effect::gamble(
                0.35,
                vec![
                    Effect::fixed(Stat::Budget, 6000),
                    Effect::fixed(Stat::Reputation, 5),
                    Effect::dimension(Dimension::Algorithm, 3),
                ],
                vec![Effect::fixed(Stat::Entropy, 4)],
            )]),
    ]
}

// ── Eligibility ────────────────────────────────────────────────────

/// Result of applying an operation or closing a turn.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: GameState,
    pub log: Vec<LogEntry>,
    /// Set when the transition ran an exam.
    pub exam: Option<ExamResult>,
}

/// Side jobs allowed this turn, including the archetype bonus.
pub fn side_job_limit(state: &GameState, tables: &GameTables) -> u32 {
    cadence::SIDE_JOBS_PER_TURN + tables.archetype(state.archetype).ability.side_job_bonus()
}

/// Cost actually charged for `op` against `state` and `target`.
pub fn effective_cost(
    state: &GameState,
    tables: &GameTables,
    op: &OperationDef,
    target: Option<Target>,
) -> Result<Cost, String> {
    let reduce = |budget: u64| {
        let pct = team::aggregate(&state.team, tables).cost_reduction_pct as u64;
        budget * (100 - pct.min(100)) / 100
    };
    let budget = match op.scaling {
        CostScaling::Flat => reduce(op.cost.budget),
        CostScaling::EquipmentLevel(track) => {
            let level = state.equipment.get(track).level;
            let cost = tables
                .equipment(track)
                .upgrade_cost(level)
                .ok_or_else(|| format!("{} is already at max level", track.label()))?;
            reduce(cost)
        }
        CostScaling::CandidateHiringCost => {
            let id = member_id(target)?;
            let candidate = state
                .hiring_pool
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| format!("no candidate with id {}", id))?;
            non_negative(candidate.hiring_cost, "hiring cost")?
        }
        CostScaling::MemberSeverance => {
            let id = member_id(target)?;
            let member = state
                .team
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| format!("no team member with id {}", id))?;
            non_negative(member.salary, "severance")?
        }
    };
    Ok(Cost { budget, ..op.cost })
}

fn non_negative(amount: i64, what: &str) -> Result<u64, String> {
    u64::try_from(amount).map_err(|_| format!("{} is negative: {}", what, amount))
}

fn member_id(target: Option<Target>) -> Result<u32, String> {
    match target {
        Some(Target::Member(id)) => Ok(id),
        _ => Err("a member target is required".to_string()),
    }
}

fn check_requirement(
    state: &GameState,
    tables: &GameTables,
    requirement: Requirement,
    target: Option<Target>,
) -> Result<(), String> {
    match requirement {
        Requirement::DimensionTarget => match target {
            Some(Target::Dimension(_)) => Ok(()),
            _ => Err("a dimension target is required".into()),
        },
        Requirement::CandidateTarget => {
            let id = member_id(target)?;
            if state.hiring_pool.iter().any(|m| m.id == id) {
                Ok(())
            } else {
                Err(format!("no candidate with id {}", id))
            }
        }
        Requirement::MemberTarget => {
            let id = member_id(target)?;
            if state.team.iter().any(|m| m.id == id) {
                Ok(())
            } else {
                Err(format!("no team member with id {}", id))
            }
        }
        Requirement::Meltdown => {
            if state.risks.server_meltdown {
                Ok(())
            } else {
                Err("servers are not melting down".into())
            }
        }
        Requirement::EquipmentBelowMax(track) => {
            let level = state.equipment.get(track).level;
            if tables.equipment(track).upgrade_cost(level).is_some() {
                Ok(())
            } else {
                Err(format!("{} is already at max level", track.label()))
            }
        }
        Requirement::TeamNotEmpty => {
            if state.team.is_empty() {
                Err("the team is empty".into())
            } else {
                Ok(())
            }
        }
    }
}

/// Pure eligibility check. Returns the cost that would be charged.
pub fn check_eligibility(
    state: &GameState,
    tables: &GameTables,
    id: OperationId,
    target: Option<Target>,
) -> Result<Cost, EngineError> {
    if !state.is_playing() {
        return Err(EngineError::GameFinished(state.game_status));
    }
    let op = tables
        .catalog
        .get(id)
        .ok_or_else(|| EngineError::ineligible(id, "not in the catalog"))?;

    for requirement in &op.requirements {
        check_requirement(state, tables, *requirement, target)
            .map_err(|reason| EngineError::ineligible(id, reason))?;
    }

    if op.category == Category::SideJob
        && state.progress.side_jobs_this_turn >= side_job_limit(state, tables)
    {
        return Err(EngineError::ineligible(id, "no side-job slots left this turn"));
    }

    let cost = effective_cost(state, tables, op, target).map_err(|reason| EngineError::ineligible(id, reason))?;
    let r = &state.resources;
    let shortfall = if r.budget < cost.budget as i64 {
        Some(format!("needs budget {}, have {}", cost.budget, r.budget))
    } else if r.compute_points < cost.compute_points {
        Some(format!("needs {} compute, have {}", cost.compute_points, r.compute_points))
    } else if r.dirty_data < cost.dirty_data {
        Some(format!("needs {} dirty data, have {}", cost.dirty_data, r.dirty_data))
    } else if r.golden_data < cost.golden_data {
        Some(format!("needs {} golden data, have {}", cost.golden_data, r.golden_data))
    } else {
        None
    };
    match shortfall {
        Some(reason) => Err(EngineError::ineligible(id, reason)),
        None => Ok(cost),
    }
}

/// `canExecute`: true when [`check_eligibility`] would succeed.
pub fn can_execute(state: &GameState, tables: &GameTables, id: OperationId, target: Option<Target>) -> bool {
    check_eligibility(state, tables, id, target).is_ok()
}

/// Targets worth trying for an operation in the current state.
pub fn candidate_targets(state: &GameState, op: &OperationDef) -> Vec<Option<Target>> {
    if op.requirements.contains(&Requirement::DimensionTarget) {
        Dimension::ALL.iter().map(|d| Some(Target::Dimension(*d))).collect()
    } else if op.requirements.contains(&Requirement::CandidateTarget) {
        state.hiring_pool.iter().map(|m| Some(Target::Member(m.id))).collect()
    } else if op.requirements.contains(&Requirement::MemberTarget) {
        state.team.iter().map(|m| Some(Target::Member(m.id))).collect()
    } else {
        vec![None]
    }
}

/// Operations executable right now with at least one target.
pub fn eligible_operations(state: &GameState, tables: &GameTables) -> Vec<OperationId> {
    tables
        .catalog
        .all()
        .filter(|op| {
            candidate_targets(state, op)
                .into_iter()
                .any(|t| can_execute(state, tables, op.id, t))
        })
        .map(|op| op.id)
        .collect()
}

// ── Application ────────────────────────────────────────────────────

/// Apply one operation to a copy of `state`.
pub fn apply_operation(
    state: &GameState,
    tables: &GameTables,
    id: OperationId,
    target: Option<Target>,
    rng: &mut impl Rng,
) -> Result<Transition, EngineError> {
    let cost = check_eligibility(state, tables, id, target)?;
    let op = tables
        .catalog
        .get(id)
        .ok_or_else(|| EngineError::ineligible(id, "not in the catalog"))?;

    let mut next = state.clone();
    let r = &mut next.resources;
    r.budget -= cost.budget as i64;
    r.compute_points -= cost.compute_points;
    r.dirty_data -= cost.dirty_data;
    r.golden_data -= cost.golden_data;
    if op.category == Category::SideJob {
        next.progress.side_jobs_this_turn += 1;
    }

    let ctx = EffectContext::new(&next, tables, Some(op.category), target);
    let mut report = EffectReport::default();
    apply_effects(&mut next, &op.effects, &ctx, rng, &mut report)
        .map_err(|e| EngineError::ineligible(id, e.to_string()))?;
    next.normalize(tables);

    debug!("{} applied: {}", id.id(), report.summary());

    let turn = next.progress.turn;
    let mut log = vec![LogEntry::new(
        LogKind::Operation,
        turn,
        format!("{}: {}", op.name, report.summary()),
    )];
    if let Some(entry) = check_immediate_defeat(&mut next) {
        log.push(entry);
    }
    Ok(Transition { state: next, log, exam: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::Archetype;
    use crate::difficulty::Difficulty;
    use crate::state::{create_game, GameStatus};
    use rand::{rngs::SmallRng, SeedableRng};
    use std::collections::HashSet;

    fn setup() -> (GameState, GameTables, SmallRng) {
        let tables = GameTables::standard();
        let mut rng = SmallRng::seed_from_u64(2024);
        let mut state = create_game(Archetype::Startup, Difficulty::Normal, &tables);
        team::refresh_hiring_pool(&mut state, &tables, &mut rng);
        (state, tables, rng)
    }

    fn assert_in_range(state: &GameState) {
        let m = &state.metrics;
        for v in [m.fit_score, m.entropy, m.fit_score_cap, m.accuracy, m.speed, m.creativity, m.robustness] {
            assert!((0..=100).contains(&v));
        }
        for d in Dimension::ALL {
            assert!((0..=100).contains(&state.dimensions.get(d)));
        }
        assert!((0..=100).contains(&state.risks.legal_risk));
        assert!((0..=100).contains(&state.reputation));
        let r = &state.resources;
        assert!(r.compute_points <= r.compute_max);
        assert!(r.dirty_data + r.golden_data <= r.data_capacity);
    }

    #[test]
    fn test_every_category_has_operations() {
        let catalog = OperationCatalog::standard();
        assert_eq!(catalog.groups.len(), Category::ALL.len());
        for cat in Category::ALL {
            assert!(!catalog.category(cat).is_empty(), "{} is empty", cat.id());
            for op in catalog.category(cat) {
                assert_eq!(op.category, cat);
            }
        }
    }

    #[test]
    fn test_category_union_equals_catalog() {
        let catalog = OperationCatalog::standard();
        let from_groups: Vec<OperationId> = Category::ALL
            .iter()
            .flat_map(|c| catalog.category(*c).iter().map(|op| op.id))
            .collect();
        let unique: HashSet<OperationId> = from_groups.iter().copied().collect();
        assert_eq!(from_groups.len(), unique.len(), "operation filed twice");
        let all: HashSet<OperationId> = OperationId::ALL.into_iter().collect();
        assert_eq!(unique, all);
        assert_eq!(catalog.len(), OperationId::ALL.len());
    }

    #[test]
    fn test_id_round_trip() {
        for id in OperationId::ALL {
            assert_eq!(OperationId::from_id(id.id()), Some(id));
        }
        assert_eq!(OperationId::from_id("time_travel"), None);
    }

    #[test]
    fn test_apply_deducts_cost_and_logs() {
        let (state, tables, mut rng) = setup();
        let t = apply_operation(&state, &tables, OperationId::BuyDataset, None, &mut rng).unwrap();
        assert_eq!(t.state.resources.budget, state.resources.budget - 2000);
        assert_eq!(t.state.resources.golden_data, state.resources.golden_data + 15);
        assert_eq!(t.log.len(), 1);
        assert_eq!(t.log[0].kind, LogKind::Operation);
        // caller's state is untouched
        assert_eq!(state.resources.golden_data, 5);
    }

    #[test]
    fn test_ineligible_leaves_state_unchanged() {
        let (mut state, tables, mut rng) = setup();
        state.resources.compute_points = 0;
        let before = state.clone();
        let err = apply_operation(&state, &tables, OperationId::BasicTraining, None, &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::IneligibleOperation { operation: OperationId::BasicTraining, .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_hiring_unaffordable_candidate() {
        let (mut state, tables, mut rng) = setup();
        state.hiring_pool[0].hiring_cost = 1200;
        state.resources.budget = 1000;
        let id = state.hiring_pool[0].id;
        let before = state.clone();

        let err = apply_operation(&state, &tables, OperationId::HireCandidate, Some(Target::Member(id)), &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::IneligibleOperation { .. }));
        assert_eq!(state.team, before.team);
        assert_eq!(state.hiring_pool, before.hiring_pool);
        assert_eq!(state.resources.budget, 1000);
    }

    #[test]
    fn test_negative_member_costs_are_rejected() {
        let (mut state, tables, mut rng) = setup();
        state.hiring_pool[0].hiring_cost = -5000;
        let id = state.hiring_pool[0].id;
        let err = apply_operation(&state, &tables, OperationId::HireCandidate, Some(Target::Member(id)), &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::IneligibleOperation { .. }));

        let mut member = state.hiring_pool.remove(1);
        member.salary = -9000;
        let id = member.id;
        state.team.push(member);
        let err = apply_operation(&state, &tables, OperationId::FireMember, Some(Target::Member(id)), &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::IneligibleOperation { .. }));
    }

    #[test]
    fn test_hire_and_fire() {
        let (state, tables, mut rng) = setup();
        let candidate = state.hiring_pool[1].clone();
        let hired = apply_operation(
            &state,
            &tables,
            OperationId::HireCandidate,
            Some(Target::Member(candidate.id)),
            &mut rng,
        )
        .unwrap()
        .state;
        assert_eq!(hired.resources.budget, state.resources.budget - candidate.hiring_cost);
        assert_eq!(hired.team.len(), 1);
        assert_eq!(hired.hiring_pool.len(), state.hiring_pool.len() - 1);

        let fired = apply_operation(
            &hired,
            &tables,
            OperationId::FireMember,
            Some(Target::Member(candidate.id)),
            &mut rng,
        )
        .unwrap()
        .state;
        assert!(fired.team.is_empty());
        assert_eq!(fired.resources.budget, hired.resources.budget - candidate.salary);
    }

    #[test]
    fn test_focus_dimension_requires_target() {
        let (state, tables, mut rng) = setup();
        assert!(!can_execute(&state, &tables, OperationId::FocusDimension, None));
        let t = apply_operation(
            &state,
            &tables,
            OperationId::FocusDimension,
            Some(Target::Dimension(Dimension::UserExperience)),
            &mut rng,
        )
        .unwrap();
        assert_eq!(t.state.dimensions.user_experience, state.dimensions.user_experience + 8);
    }

    #[test]
    fn test_side_job_cap() {
        let (mut state, tables, mut rng) = setup();
        state.resources.compute_points = state.resources.compute_max;
        let limit = side_job_limit(&state, &tables);
        assert_eq!(limit, 3, "startup gets an extra side job");
        for _ in 0..limit {
            state = apply_operation(&state, &tables, OperationId::FreelanceGig, None, &mut rng)
                .unwrap()
                .state;
        }
        assert_eq!(state.progress.side_jobs_this_turn, limit);
        assert!(!can_execute(&state, &tables, OperationId::FreelanceGig, None));
    }

    #[test]
    fn test_emergency_patch_only_in_meltdown() {
        let (mut state, tables, mut rng) = setup();
        assert!(!can_execute(&state, &tables, OperationId::EmergencyPatch, None));
        state.risks.server_meltdown = true;
        state.risks.meltdown_turns = 2;
        state.metrics.entropy = 85;
        let t = apply_operation(&state, &tables, OperationId::EmergencyPatch, None, &mut rng).unwrap();
        assert!(!t.state.risks.server_meltdown);
        assert_eq!(t.state.risks.meltdown_turns, 0);
        assert_eq!(t.state.metrics.entropy, 70);
    }

    #[test]
    fn test_equipment_upgrade_cost_scales_and_caps() {
        let (mut state, tables, mut rng) = setup();
        state.resources.budget = 100_000;
        let mut spent = Vec::new();
        for _ in 0..3 {
            let before = state.resources.budget;
            state = apply_operation(&state, &tables, OperationId::UpgradeGpu, None, &mut rng)
                .unwrap()
                .state;
            spent.push(before - state.resources.budget);
        }
        assert_eq!(spent, vec![3000, 6000, 9000]);
        assert_eq!(state.equipment.gpu.level, 4);
        assert!(!can_execute(&state, &tables, OperationId::UpgradeGpu, None));
    }

    #[test]
    fn test_finished_game_rejects_operations() {
        let (mut state, tables, mut rng) = setup();
        state.game_status = GameStatus::GameOver;
        let err = apply_operation(&state, &tables, OperationId::BuyDataset, None, &mut rng).unwrap_err();
        assert_eq!(err, EngineError::GameFinished(GameStatus::GameOver));
    }

    #[test]
    fn test_gamble_operations_fire_one_branch() {
        let (mut state, tables, mut rng) = setup();
        state.resources.dirty_data = 100;
        let mut outcomes = HashSet::new();
        for _ in 0..200 {
            state.resources.compute_points = state.resources.compute_max;
            state.resources.dirty_data = 100;
            state.metrics.accuracy = 20;
            state.metrics.entropy = 20;
            let t = apply_operation(&state, &tables, OperationId::YoloTraining, None, &mut rng).unwrap();
            let gained_accuracy = t.state.metrics.accuracy > 20;
            let gained_entropy = t.state.metrics.entropy > 20;
            assert!(gained_accuracy ^ gained_entropy, "exactly one branch must apply");
            outcomes.insert(gained_accuracy);
        }
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_random_play_keeps_gauges_in_range() {
        let (mut state, tables, mut rng) = setup();
        state.resources.budget = 1_000_000;
        for _ in 0..500 {
            let ops = eligible_operations(&state, &tables);
            if ops.is_empty() {
                state.resources.compute_points = state.resources.compute_max;
                state.progress.side_jobs_this_turn = 0;
                continue;
            }
            let id = ops[rng.gen_range(0..ops.len())];
            let op = tables.catalog.get(id).unwrap();
            let targets: Vec<_> = candidate_targets(&state, op)
                .into_iter()
                .filter(|t| can_execute(&state, &tables, id, *t))
                .collect();
            let target = targets[rng.gen_range(0..targets.len())];
            let t = apply_operation(&state, &tables, id, target, &mut rng).unwrap();
            state = t.state;
            assert_in_range(&state);
            if !state.is_playing() {
                break;
            }
            if state.resources.compute_points == 0 {
                state.resources.compute_points = state.resources.compute_max;
                state.progress.side_jobs_this_turn = 0;
            }
        }
    }
}
