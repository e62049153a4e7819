//! Pure simulation logic for Overfit.
//!
//! This crate contains all game rules that are independent of storage,
//! rendering, or runtime. Functions take plain data plus a seeded RNG and
//! return new data, so every rule is unit-testable and replayable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`archetypes`] | Lab archetypes (startup, bigtech, academic) and their abilities |
//! | [`constants`] | Cadences, fatal thresholds, gauge ranges, schema version |
//! | [`difficulty`] | Difficulty presets, exam gates, difficulty growth |
//! | [`effects`] | Effect sum type, gamble resolution, live modifiers |
//! | [`ending`] | Score formula, grades, ending selection |
//! | [`equipment`] | GPU/storage/network/cooling upgrade tracks |
//! | [`error`] | `EngineError` |
//! | [`events`] | Random negative events rolled at turn close |
//! | [`exam`] | Exam scenarios and the reward/pass evaluator |
//! | [`log`] | Log entries handed to the presentation layer |
//! | [`names`] | Candidate name generation |
//! | [`operations`] | The 31-entry operation catalog, eligibility, application |
//! | [`state`] | `GameState` aggregate, clamping, `create_game` |
//! | [`tables`] | `GameTables` bundle and structural validation |
//! | [`team`] | Rarity/trait tables, candidate generation, team aggregation |
//! | [`turn`] | Turn-close state machine |

pub mod archetypes;
pub mod constants;
pub mod difficulty;
pub mod effects;
pub mod ending;
pub mod equipment;
pub mod error;
pub mod events;
pub mod exam;
pub mod log;
pub mod names;
pub mod operations;
pub mod state;
pub mod tables;
pub mod team;
pub mod turn;

pub use error::EngineError;
pub use operations::{apply_operation, OperationId, Target, Transition};
pub use state::{create_game, GameState, GameStatus};
pub use tables::GameTables;
pub use turn::end_turn;
