//! Tool Backend Port - the datastore functions behind each tool.
//!
//! The executor owns everything around an invocation (splitting,
//! substitution, timeouts, result wrapping). A backend only runs one tool
//! with concrete arguments and returns a typed payload.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{EntityClass, EntityId};
use crate::domain::tools::{ArgumentError, Payload, ToolArgs, ToolFailureKind, ToolId};

use super::ClaimGraphError;

/// Port for invoking catalogue tools.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Runs one tool. Arguments have already been substituted.
    ///
    /// # Returns
    ///
    /// * `Ok(Payload)` - rows shaped as the tool's definition declares
    /// * `Err(ToolExecutionError)` - the call failed; the executor records
    ///   the failure and moves on
    async fn invoke(&self, tool: ToolId, args: &ToolArgs) -> Result<Payload, ToolExecutionError>;
}

/// Errors that can occur during tool execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolExecutionError {
    /// Arguments were missing, mistyped or unresolved
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] ArgumentError),

    /// Referenced entity does not exist
    #[error("{class} {id} not found")]
    NotFound { class: EntityClass, id: EntityId },

    /// Tool is declared but this backend cannot run it
    #[error("Tool not supported by backend: {0}")]
    Unsupported(ToolId),

    /// Call exceeded its time budget
    #[error("Tool call timed out after {0}ms")]
    Timeout(u64),

    /// Infrastructure/system error
    #[error("System error: {0}")]
    SystemError(String),
}

impl ToolExecutionError {
    /// Creates a system error.
    pub fn system(message: impl Into<String>) -> Self {
        Self::SystemError(message.into())
    }

    /// Failure category recorded on the tool result.
    pub fn kind(&self) -> ToolFailureKind {
        match self {
            Self::InvalidArguments(_) => ToolFailureKind::InvalidArguments,
            Self::NotFound { .. } => ToolFailureKind::NotFound,
            Self::Timeout(_) => ToolFailureKind::Timeout,
            Self::Unsupported(_) | Self::SystemError(_) => ToolFailureKind::Backend,
        }
    }
}

impl From<ClaimGraphError> for ToolExecutionError {
    fn from(err: ClaimGraphError) -> Self {
        match err {
            ClaimGraphError::NotFound { class, id } => Self::NotFound { class, id },
            ClaimGraphError::Unavailable(message) => Self::SystemError(message),
        }
    }
}
