//! Overfit Core - seeded game sessions
//!
//! Wraps the pure rules in `overfit-logic` with everything a front end
//! needs to run a game: a session-owned RNG, a stamped log history, the
//! exam record, and JSON/binary save files with schema migration.
//!
//! # Example
//!
//! ```rust,no_run
//! use overfit_core::prelude::*;
//!
//! let mut engine = GameEngine::new(SessionConfig {
//!     archetype: Archetype::Startup,
//!     difficulty: Difficulty::Normal,
//!     seed: Some(7),
//! });
//!
//! engine.apply(OperationId::ScrapeWeb, None).unwrap();
//! engine.end_turn().unwrap();
//!
//! let save = engine.save_json().unwrap();
//! engine.load_json(&save).unwrap();
//! ```

pub mod engine;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::engine::{GameEngine, SessionConfig};
    pub use crate::persistence::SaveError;
    pub use overfit_logic::archetypes::Archetype;
    pub use overfit_logic::difficulty::Difficulty;
    pub use overfit_logic::ending::{EndingSummary, Grade};
    pub use overfit_logic::state::{Dimension, EndingType, GameState, GameStatus};
    pub use overfit_logic::{EngineError, OperationId, Target};
}
