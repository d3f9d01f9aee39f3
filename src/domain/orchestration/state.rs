//! OrchestrationState - the root of one query's session.
//!
//! Single writer: only the orchestrator mutates it, and it is dropped once
//! the final response has been returned.

use serde::Serialize;

use crate::domain::entities::ResolvedEntityMap;
use crate::domain::evidence::ProvenanceSummary;
use crate::domain::foundation::{QueryId, StateMachine, Timestamp, ValidationError};

use super::{
    iteration_digest, CompletionReason, IterationRecord, MaxIterations, OrchestrationError,
    OrchestrationPhase,
};

#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationState {
    query_id: QueryId,
    original_query: String,
    iteration: u32,
    max_iterations: MaxIterations,
    phase: OrchestrationPhase,
    history: Vec<IterationRecord>,
    rolling_summary: String,
    resolved: ResolvedEntityMap,
    final_response: Option<String>,
    complete: bool,
    completion_reason: Option<CompletionReason>,
    started_at: Timestamp,
}

impl OrchestrationState {
    /// Starts a session at iteration 1 in `PLANNING`.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the query is blank
    pub fn new(query: &str, max_iterations: MaxIterations) -> Result<Self, ValidationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::empty_field("query"));
        }
        Ok(Self {
            query_id: QueryId::new(),
            original_query: query.to_string(),
            iteration: 1,
            max_iterations,
            phase: OrchestrationPhase::Planning,
            history: Vec::new(),
            rolling_summary: String::new(),
            resolved: ResolvedEntityMap::new(),
            final_response: None,
            complete: false,
            completion_reason: None,
            started_at: Timestamp::now(),
        })
    }

    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations.get()
    }

    pub fn phase(&self) -> OrchestrationPhase {
        self.phase
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn rolling_summary(&self) -> &str {
        &self.rolling_summary
    }

    pub fn resolved(&self) -> &ResolvedEntityMap {
        &self.resolved
    }

    /// Handed to the executor for the duration of one call.
    pub fn resolved_mut(&mut self) -> &mut ResolvedEntityMap {
        &mut self.resolved
    }

    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.completion_reason
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// True once the current iteration is the last allowed one.
    pub fn budget_exhausted(&self) -> bool {
        self.iteration >= self.max_iterations.get()
    }

    /// Moves to `target`, enforcing the phase graph.
    pub fn advance(&mut self, target: OrchestrationPhase) -> Result<(), OrchestrationError> {
        self.phase = self
            .phase
            .transition_to(target)
            .map_err(OrchestrationError::InvalidTransition)?;
        Ok(())
    }

    /// Appends a finished iteration and its digest.
    pub fn record_iteration(&mut self, record: IterationRecord) {
        let digest = iteration_digest(&record);
        if !self.rolling_summary.is_empty() {
            self.rolling_summary.push_str("\n\n");
        }
        self.rolling_summary.push_str(&digest);
        self.history.push(record);
    }

    /// Loops back to planning for the next iteration.
    pub fn next_iteration(&mut self) -> Result<(), OrchestrationError> {
        self.advance(OrchestrationPhase::Planning)?;
        self.iteration += 1;
        Ok(())
    }

    /// Stores the answer and enters `DONE`.
    pub fn finish(&mut self, response: String, reason: CompletionReason) -> Result<(), OrchestrationError> {
        self.advance(OrchestrationPhase::Done)?;
        self.final_response = Some(response);
        self.completion_reason = Some(reason);
        self.complete = true;
        Ok(())
    }
}

/// Result handed back to callers of a completed query.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationOutcome {
    pub query_id: QueryId,
    pub final_response: String,
    pub completion_reason: CompletionReason,
    pub iterations: u32,
    pub history: Vec<IterationRecord>,
    pub resolved: ResolvedEntityMap,
    pub provenance: ProvenanceSummary,
    pub duration_ms: u64,
}

impl OrchestrationOutcome {
    /// Builds the outcome from a finished state.
    ///
    /// Hands the state back unchanged if it has not reached `DONE`.
    pub fn from_state(
        state: OrchestrationState,
        provenance: ProvenanceSummary,
    ) -> Result<Self, OrchestrationState> {
        let (Some(reason), Some(response)) = (state.completion_reason, state.final_response.clone())
        else {
            return Err(state);
        };
        let duration_ms = Timestamp::now().millis_since(&state.started_at);
        Ok(Self {
            query_id: state.query_id,
            final_response: response,
            completion_reason: reason,
            iterations: state.iteration,
            history: state.history,
            resolved: state.resolved,
            provenance,
            duration_ms,
        })
    }
}
