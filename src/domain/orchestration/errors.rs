//! Error types for the orchestration loop.

use std::fmt;

use crate::domain::foundation::ValidationError;
use crate::ports::ServiceError;

use super::{OrchestrationPhase, OrchestrationState};

/// Fatal failure of one query.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("Planning failed: {0}")]
    Planning(ServiceError),

    #[error("Evaluation failed: {0}")]
    Evaluation(ServiceError),

    #[error("Synthesis failed: {0}")]
    Synthesis(ServiceError),

    #[error("Cancelled during {phase}")]
    Cancelled { phase: OrchestrationPhase },

    #[error("Invalid phase transition: {0}")]
    InvalidTransition(ValidationError),
}

impl OrchestrationError {
    /// True when the underlying service call ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Planning(ServiceError::Timeout { .. })
                | Self::Evaluation(ServiceError::Timeout { .. })
                | Self::Synthesis(ServiceError::Timeout { .. })
        )
    }
}

/// A fatal error together with the state reached before it.
#[derive(Debug)]
pub struct OrchestrationFailure {
    pub error: OrchestrationError,
    pub state: Box<OrchestrationState>,
}

impl OrchestrationFailure {
    pub fn new(error: OrchestrationError, state: OrchestrationState) -> Self {
        Self {
            error,
            state: Box::new(state),
        }
    }
}

impl fmt::Display for OrchestrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (iteration {}, phase {})",
            self.error,
            self.state.iteration(),
            self.state.phase()
        )
    }
}

impl std::error::Error for OrchestrationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
