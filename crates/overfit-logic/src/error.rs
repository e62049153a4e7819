//! Engine error taxonomy.

use thiserror::Error;

use crate::effects::EffectError;
use crate::operations::OperationId;
use crate::state::GameStatus;

/// Errors returned by engine entry points. None of them leave a partially
/// mutated state behind: every entry point works on a copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The operation's eligibility predicate rejected the current state.
    #[error("operation `{}` is not eligible: {reason}", operation.id())]
    IneligibleOperation {
        operation: OperationId,
        reason: String,
    },
    /// The session already ended; only read access is allowed.
    #[error("game has already ended ({0:?})")]
    GameFinished(GameStatus),
    /// An automatic effect (random event) could not be applied.
    #[error(transparent)]
    Effect(#[from] EffectError),
}

impl EngineError {
    pub fn ineligible(operation: OperationId, reason: impl Into<String>) -> Self {
        EngineError::IneligibleOperation {
            operation,
            reason: reason.into(),
        }
    }
}
