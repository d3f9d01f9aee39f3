//! Structured-completion service ports used by the orchestration loop.
//!
//! Each port is one request/response call. Implementations return typed
//! domain values; anything that cannot be turned into one is a contract
//! violation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::QueryId;
use crate::domain::orchestration::SufficiencyEvaluation;
use crate::domain::tools::ToolPlan;

use super::AIError;

/// Input of one planning call.
#[derive(Debug, Clone)]
pub struct PlanningRequest {
    pub query_id: QueryId,
    pub query: String,
    pub iteration: u32,
    pub rolling_summary: String,
    /// Rendered resolved-entity map, including positional indices.
    pub resolved_entities: String,
}

/// Input of one evaluation call.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub query_id: QueryId,
    pub query: String,
    pub iteration: u32,
    /// This iteration's accumulated tool outputs.
    pub tool_outputs: String,
    pub rolling_summary: String,
}

/// Input of the final synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub query_id: QueryId,
    pub query: String,
    pub accumulated_context: String,
}

/// Proposes the next tool calls.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, request: PlanningRequest) -> Result<ToolPlan, ServiceError>;
}

/// Judges whether gathered evidence answers the query.
#[async_trait]
pub trait SufficiencyEvaluator: Send + Sync {
    async fn evaluate(&self, request: EvaluationRequest) -> Result<SufficiencyEvaluation, ServiceError>;
}

/// Writes the final natural-language answer.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<String, ServiceError>;
}

/// Failures at the planning, evaluation and synthesis boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Output did not match the expected schema.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// The underlying provider failed.
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    /// The call did not finish within its time budget.
    #[error("timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// Synthesis returned nothing.
    #[error("empty output")]
    EmptyOutput,

    /// The query was cancelled before or during the call.
    #[error("cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }

    /// Whether another attempt may succeed.
    ///
    /// Contract violations are retried because a fresh completion is a new
    /// sample.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ContractViolation(_) | Self::Timeout { .. } => true,
            Self::Provider(err) => err.is_retryable(),
            Self::EmptyOutput | Self::Cancelled => false,
        }
    }

    /// Retry rule for free-form synthesis: only transient failures.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Provider(err) => err.is_retryable(),
            _ => false,
        }
    }
}
