//! Configuration tables bundled into one injectable value.
//!
//! Every engine function takes `&GameTables` instead of reaching for
//! globals, so tests can tweak a single number (say, event chance) on a
//! private copy. [`GameTables::standard`] builds the shipped presets.

use thiserror::Error;

use crate::archetypes::{archetype_configs, Archetype, ArchetypeConfig};
use crate::difficulty::{difficulty_configs, Difficulty, DifficultyConfig};
use crate::effects::Effect;
use crate::equipment::{equipment_configs, EquipmentConfig, EquipmentTrack};
use crate::events::{negative_events, NegativeEvent};
use crate::exam::{exam_scenarios, ExamScenario};
use crate::operations::{Category, OperationCatalog};
use crate::team::{rarity_configs, trait_configs, Rarity, RarityConfig, Trait, TraitConfig};

#[derive(Debug, Clone)]
pub struct GameTables {
    pub archetypes: [ArchetypeConfig; 3],
    pub difficulties: [DifficultyConfig; 4],
    pub rarities: [RarityConfig; 4],
    pub traits: [TraitConfig; 8],
    pub equipment: [EquipmentConfig; 4],
    pub scenarios: Vec<ExamScenario>,
    pub events: Vec<NegativeEvent>,
    pub catalog: OperationCatalog,
}

impl GameTables {
    pub fn standard() -> Self {
        Self {
            archetypes: archetype_configs(),
            difficulties: difficulty_configs(),
            rarities: rarity_configs(),
            traits: trait_configs(),
            equipment: equipment_configs(),
            scenarios: exam_scenarios(),
            events: negative_events(),
            catalog: OperationCatalog::standard(),
        }
    }

    pub fn archetype(&self, archetype: Archetype) -> &ArchetypeConfig {
        &self.archetypes[archetype.index()]
    }

    pub fn difficulty(&self, difficulty: Difficulty) -> &DifficultyConfig {
        &self.difficulties[difficulty.index()]
    }

    pub fn rarity(&self, rarity: Rarity) -> &RarityConfig {
        &self.rarities[rarity.index()]
    }

    pub fn trait_config(&self, kind: Trait) -> &TraitConfig {
        &self.traits[kind.index()]
    }

    pub fn equipment(&self, track: EquipmentTrack) -> &EquipmentConfig {
        &self.equipment[track.index()]
    }
}

impl Default for GameTables {
    fn default() -> Self {
        Self::standard()
    }
}

/// A structural problem found by [`validate_tables`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("{table} entry {index} is filed under the wrong variant")]
    Misordered { table: &'static str, index: usize },
    #[error("rarity weights sum to {0}, expected 100")]
    RarityWeights(u32),
    #[error("category `{}` has no operations", .0.id())]
    EmptyCategory(Category),
    #[error("operation `{0}` is filed under `{1}` but declares another category")]
    CategoryMismatch(&'static str, &'static str),
    #[error("gamble in `{0}` has success rate {1} outside [0, 1]")]
    GambleRate(String, f64),
    #[error("difficulty `{0}` has threshold2 before threshold1")]
    ThresholdOrder(&'static str),
    #[error("scenario `{0}` has no focus dimensions")]
    EmptyScenario(&'static str),
    #[error("no exam scenarios defined")]
    NoScenarios,
    #[error("no negative events defined")]
    NoEvents,
}

fn gamble_rates(effects: &[Effect], out: &mut Vec<f64>) {
    for effect in effects {
        if let Effect::Gamble(g) = effect {
            out.push(g.success_rate);
            gamble_rates(&g.success, out);
            gamble_rates(&g.failure, out);
        }
    }
}

/// Check the tables for structural mistakes. Empty means valid.
pub fn validate_tables(tables: &GameTables) -> Vec<TableError> {
    let mut errors = Vec::new();

    for (i, a) in tables.archetypes.iter().enumerate() {
        if a.archetype.index() != i {
            errors.push(TableError::Misordered { table: "archetypes", index: i });
        }
    }
    for (i, d) in tables.difficulties.iter().enumerate() {
        if d.difficulty.index() != i {
            errors.push(TableError::Misordered { table: "difficulties", index: i });
        }
        if d.threshold2.exam_count < d.threshold1.exam_count {
            errors.push(TableError::ThresholdOrder(d.difficulty.id()));
        }
    }
    for (i, r) in tables.rarities.iter().enumerate() {
        if r.rarity.index() != i {
            errors.push(TableError::Misordered { table: "rarities", index: i });
        }
    }
    for (i, t) in tables.traits.iter().enumerate() {
        if t.trait_kind.index() != i {
            errors.push(TableError::Misordered { table: "traits", index: i });
        }
    }
    for (i, e) in tables.equipment.iter().enumerate() {
        if e.track.index() != i {
            errors.push(TableError::Misordered { table: "equipment", index: i });
        }
    }

    let weights: u32 = tables.rarities.iter().map(|r| r.weight).sum();
    if weights != 100 {
        errors.push(TableError::RarityWeights(weights));
    }

    for category in Category::ALL {
        if tables.catalog.category(category).is_empty() {
            errors.push(TableError::EmptyCategory(category));
        }
    }
    for group in &tables.catalog.groups {
        for op in &group.operations {
            if op.category != group.category {
                errors.push(TableError::CategoryMismatch(op.id.id(), group.category.id()));
            }
            let mut rates = Vec::new();
            gamble_rates(&op.effects, &mut rates);
            for rate in rates {
                if !(0.0..=1.0).contains(&rate) {
                    errors.push(TableError::GambleRate(op.id.id().to_string(), rate));
                }
            }
        }
    }

    if tables.scenarios.is_empty() {
        errors.push(TableError::NoScenarios);
    }
    if tables.events.is_empty() {
        errors.push(TableError::NoEvents);
    }
    for s in &tables.scenarios {
        if s.focus_dimensions.is_empty() {
            errors.push(TableError::EmptyScenario(s.kind.id()));
        }
    }
    errors
}
