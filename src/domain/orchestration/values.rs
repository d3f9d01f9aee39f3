//! Value objects for the orchestration loop.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::tools::{ToolPlan, ToolResult};

use super::SufficiencyEvaluation;

/// Absolute upper bound on iterations per query.
pub const MAX_ITERATIONS_CAP: u32 = 20;

/// How the session was started; selects the default iteration budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationMode {
    /// A person is waiting on the answer.
    Interactive,
    /// Batch or agent-driven use.
    Autonomous,
}

impl OrchestrationMode {
    pub fn default_max_iterations(&self) -> u32 {
        match self {
            Self::Interactive => 3,
            Self::Autonomous => 10,
        }
    }
}

/// Iteration budget, validated into `[1, 20]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MaxIterations(u32);

impl MaxIterations {
    /// # Errors
    ///
    /// - `OutOfRange` if `value` is 0 or above the hard cap
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value == 0 || value > MAX_ITERATIONS_CAP {
            return Err(ValidationError::out_of_range(
                "max_iterations",
                1.0,
                MAX_ITERATIONS_CAP as f64,
                value as f64,
            ));
        }
        Ok(Self(value))
    }

    /// The mode's default budget.
    pub fn for_mode(mode: OrchestrationMode) -> Self {
        Self(mode.default_max_iterations())
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Why a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The evaluator judged the evidence sufficient.
    Sufficient,
    /// The iteration budget ran out; the answer is best effort.
    MaxIterations,
    /// The planner asserted sufficiency without proposing calls.
    PlannerSufficient,
    /// The planner found no relevant tool to call.
    NoRelevantTools,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sufficient => "sufficient",
            Self::MaxIterations => "max_iterations",
            Self::PlannerSufficient => "planner_sufficient",
            Self::NoRelevantTools => "no_relevant_tools",
        }
    }

    /// True unless the answer is a best-effort one.
    pub fn is_confident(&self) -> bool {
        matches!(self, Self::Sufficient | Self::PlannerSufficient)
    }
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything that happened in one iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    pub number: u32,
    pub plan: ToolPlan,
    pub executions: Vec<ToolResult>,
    pub evaluation: Option<SufficiencyEvaluation>,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
}

impl IterationRecord {
    pub fn failed_calls(&self) -> usize {
        self.executions.iter().filter(|r| !r.success).count()
    }

    pub fn duration_ms(&self) -> u64 {
        self.ended_at.millis_since(&self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults() {
        assert_eq!(MaxIterations::for_mode(OrchestrationMode::Interactive).get(), 3);
        assert_eq!(MaxIterations::for_mode(OrchestrationMode::Autonomous).get(), 10);
    }

    #[test]
    fn max_iterations_bounds() {
        assert!(MaxIterations::new(0).is_err());
        assert!(MaxIterations::new(1).is_ok());
        assert!(MaxIterations::new(20).is_ok());
        assert!(MaxIterations::new(21).is_err());
    }

    #[test]
    fn completion_reason_strings() {
        assert_eq!(CompletionReason::MaxIterations.to_string(), "max_iterations");
        assert_eq!(
            serde_json::to_string(&CompletionReason::NoRelevantTools).unwrap(),
            "\"no_relevant_tools\""
        );
        assert!(!CompletionReason::MaxIterations.is_confident());
    }
}
