//! Orchestrator - the bounded plan / execute / evaluate loop.
//!
//! One call to [`Orchestrator::run`] drives one query from `PLANNING` at
//! iteration 1 to `DONE`. Every step waits for the previous one: the plan
//! depends on the last evaluation and the evaluation on this iteration's
//! tool outputs.
//!
//! Tool failures are recorded and the loop goes on. Planning, evaluation
//! and synthesis failures (after retries) end the query with an
//! [`OrchestrationFailure`] carrying the state reached so far.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::domain::evidence::EvidenceAccumulator;
use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::orchestration::{
    CompletionReason, IterationRecord, OrchestrationError, OrchestrationFailure,
    OrchestrationOutcome, OrchestrationPhase, OrchestrationState, SufficiencyEvaluation,
};
use crate::domain::tools::{PlanStop, ToolPlan, ToolResult};
use crate::ports::{
    EvaluationRequest, Planner, PlanningRequest, ServiceError, SufficiencyEvaluator,
    SynthesisRequest, Synthesizer,
};

use super::{with_retry, CancellationToken, RetryPolicy, ToolExecutor};

/// Tunables of the loop that are not part of the per-query state.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationSettings {
    pub planning_retry: RetryPolicy,
    pub evaluation_retry: RetryPolicy,
    pub synthesis_retry: RetryPolicy,
    /// Row budget per tool when rendering evidence for a prompt.
    pub max_items_per_tool: usize,
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        let backoff = Duration::from_millis(500);
        let timeout = Duration::from_secs(60);
        Self {
            planning_retry: RetryPolicy::with_retries(2, backoff, timeout),
            evaluation_retry: RetryPolicy::with_retries(2, backoff, timeout),
            synthesis_retry: RetryPolicy::with_retries(2, backoff, Duration::from_secs(120)),
            max_items_per_tool: 10,
        }
    }
}

/// Drives queries through the loop. Shared between concurrent queries;
/// each run owns its own state and accumulator.
pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    evaluator: Arc<dyn SufficiencyEvaluator>,
    synthesizer: Arc<dyn Synthesizer>,
    executor: Arc<ToolExecutor>,
    settings: OrchestrationSettings,
}

impl Orchestrator {
    pub fn new(
        planner: Arc<dyn Planner>,
        evaluator: Arc<dyn SufficiencyEvaluator>,
        synthesizer: Arc<dyn Synthesizer>,
        executor: Arc<ToolExecutor>,
        settings: OrchestrationSettings,
    ) -> Self {
        Self {
            planner,
            evaluator,
            synthesizer,
            executor,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestrationSettings {
        &self.settings
    }

    /// Runs a freshly created state to completion.
    pub async fn run(
        &self,
        state: OrchestrationState,
        cancel: &CancellationToken,
    ) -> Result<OrchestrationOutcome, OrchestrationFailure> {
        let span = tracing::info_span!(
            "orchestration",
            query_id = %state.query_id(),
            max_iterations = state.max_iterations()
        );
        self.run_loop(state, cancel).instrument(span).await
    }

    async fn run_loop(
        &self,
        mut state: OrchestrationState,
        cancel: &CancellationToken,
    ) -> Result<OrchestrationOutcome, OrchestrationFailure> {
        let mut session_evidence = EvidenceAccumulator::new();

        tracing::info!(query = %state.original_query(), "Starting orchestration");

        let reason = loop {
            match self.iterate(&mut state, &mut session_evidence, cancel).await {
                Ok(Some(reason)) => break reason,
                Ok(None) => {
                    if let Err(err) = state.next_iteration() {
                        return Err(OrchestrationFailure::new(err, state));
                    }
                }
                Err(err) => return Err(fail(err, state)),
            }
        };

        if let Err(err) = self.finish(&mut state, &session_evidence, reason, cancel).await {
            return Err(fail(err, state));
        }

        match OrchestrationOutcome::from_state(state, session_evidence.provenance_summary()) {
            Ok(outcome) => {
                tracing::info!(
                    iterations = outcome.iterations,
                    completion_reason = %outcome.completion_reason,
                    duration_ms = outcome.duration_ms,
                    "Orchestration complete"
                );
                Ok(outcome)
            }
            Err(state) => {
                let phase = state.phase();
                Err(fail(
                    OrchestrationError::InvalidTransition(ValidationError::invalid_format(
                        "phase",
                        format!("finished in {} without a response", phase),
                    )),
                    state,
                ))
            }
        }
    }

    /// One PLANNING → EXECUTING → EVALUATING pass.
    ///
    /// Returns the completion reason when the loop should finish, `None`
    /// to plan again.
    async fn iterate(
        &self,
        state: &mut OrchestrationState,
        session_evidence: &mut EvidenceAccumulator,
        cancel: &CancellationToken,
    ) -> Result<Option<CompletionReason>, OrchestrationError> {
        let iteration = state.iteration();
        let started_at = Timestamp::now();

        ensure_active(cancel, state.phase())?;
        let plan = self.plan(state, cancel).await?;

        if let Some(stop) = plan.effective_stop() {
            let reason = match stop {
                PlanStop::Sufficient => CompletionReason::PlannerSufficient,
                PlanStop::NoRelevantTools => CompletionReason::NoRelevantTools,
            };
            tracing::info!(iteration, reason = %reason, "Planner stopped without tool calls");
            state.record_iteration(IterationRecord {
                number: iteration,
                plan,
                executions: Vec::new(),
                evaluation: None,
                started_at,
                ended_at: Timestamp::now(),
            });
            state.advance(OrchestrationPhase::Finishing)?;
            return Ok(Some(reason));
        }

        state.advance(OrchestrationPhase::Executing)?;
        let mut iteration_evidence = EvidenceAccumulator::new();
        let mut executions = Vec::with_capacity(plan.calls.len());
        let executed = self
            .execute_plan(&plan, state, &mut executions, &mut iteration_evidence, session_evidence, cancel)
            .await;
        let evaluated = match executed {
            Ok(()) => self.evaluate_iteration(state, &iteration_evidence, cancel).await,
            Err(err) => Err(err),
        };

        let evaluation = match evaluated {
            Ok(evaluation) => evaluation,
            Err(err) => {
                // calls already run may have resolved entities
                state.record_iteration(IterationRecord {
                    number: iteration,
                    plan,
                    executions,
                    evaluation: None,
                    started_at,
                    ended_at: Timestamp::now(),
                });
                return Err(err);
            }
        };

        let answerable = evaluation.is_sufficient() || evaluation.can_answer_now;
        tracing::info!(
            iteration,
            status = %evaluation.status,
            confidence = evaluation.confidence(),
            gaps = evaluation.gaps.len(),
            failed_calls = executions.iter().filter(|r| !r.success).count(),
            "Iteration evaluated"
        );

        state.record_iteration(IterationRecord {
            number: iteration,
            plan,
            executions,
            evaluation: Some(evaluation),
            started_at,
            ended_at: Timestamp::now(),
        });

        if answerable {
            state.advance(OrchestrationPhase::Finishing)?;
            Ok(Some(CompletionReason::Sufficient))
        } else if state.budget_exhausted() {
            tracing::info!(iteration, "Iteration budget exhausted");
            state.advance(OrchestrationPhase::Finishing)?;
            Ok(Some(CompletionReason::MaxIterations))
        } else {
            Ok(None)
        }
    }

    async fn plan(
        &self,
        state: &OrchestrationState,
        cancel: &CancellationToken,
    ) -> Result<ToolPlan, OrchestrationError> {
        let request = PlanningRequest {
            query_id: state.query_id(),
            query: state.original_query().to_string(),
            iteration: state.iteration(),
            rolling_summary: state.rolling_summary().to_string(),
            resolved_entities: state.resolved().describe(),
        };

        let plan = with_retry(
            &self.settings.planning_retry,
            "planning",
            cancel,
            ServiceError::is_retryable,
            |_| self.planner.plan(request.clone()),
        )
        .await
        .map_err(|err| service_failure(err, state.phase(), OrchestrationError::Planning))?;

        tracing::debug!(iteration = state.iteration(), calls = plan.calls.len(), "Plan received");
        Ok(plan)
    }

    /// Runs every call in order; failures are recorded, not raised.
    ///
    /// Results land in `executions` as they complete, so a cancelled run
    /// still leaves the finished calls behind.
    async fn execute_plan(
        &self,
        plan: &ToolPlan,
        state: &mut OrchestrationState,
        executions: &mut Vec<ToolResult>,
        iteration_evidence: &mut EvidenceAccumulator,
        session_evidence: &mut EvidenceAccumulator,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        for call in &plan.calls {
            ensure_active(cancel, state.phase())?;
            let result = self.executor.execute(call, state.resolved_mut()).await;
            iteration_evidence.fold(&result);
            session_evidence.fold(&result);
            executions.push(result);
        }
        Ok(())
    }

    /// EVALUATING: judges this iteration's tool outputs.
    async fn evaluate_iteration(
        &self,
        state: &mut OrchestrationState,
        iteration_evidence: &EvidenceAccumulator,
        cancel: &CancellationToken,
    ) -> Result<SufficiencyEvaluation, OrchestrationError> {
        state.advance(OrchestrationPhase::Evaluating)?;
        ensure_active(cancel, state.phase())?;

        let tool_outputs = iteration_evidence.to_context(self.settings.max_items_per_tool);
        let request = EvaluationRequest {
            query_id: state.query_id(),
            query: state.original_query().to_string(),
            iteration: state.iteration(),
            tool_outputs,
            rolling_summary: state.rolling_summary().to_string(),
        };

        with_retry(
            &self.settings.evaluation_retry,
            "evaluation",
            cancel,
            ServiceError::is_retryable,
            |_| self.evaluator.evaluate(request.clone()),
        )
        .await
        .map_err(|err| service_failure(err, state.phase(), OrchestrationError::Evaluation))
    }

    /// FINISHING: synthesize from accumulated context only, then `DONE`.
    async fn finish(
        &self,
        state: &mut OrchestrationState,
        session_evidence: &EvidenceAccumulator,
        reason: CompletionReason,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        ensure_active(cancel, state.phase())?;

        let mut accumulated_context = String::new();
        if !state.rolling_summary().is_empty() {
            accumulated_context.push_str("# Reasoning so far\n");
            accumulated_context.push_str(state.rolling_summary());
            accumulated_context.push_str("\n\n");
        }
        accumulated_context.push_str("# Evidence\n");
        accumulated_context.push_str(&session_evidence.to_context(self.settings.max_items_per_tool));
        if !reason.is_confident() {
            accumulated_context.push_str(&format!(
                "\n\nNote: evidence gathering stopped ({}); the answer is best effort.",
                reason
            ));
        }

        let request = SynthesisRequest {
            query_id: state.query_id(),
            query: state.original_query().to_string(),
            accumulated_context,
        };

        let response = with_retry(
            &self.settings.synthesis_retry,
            "synthesis",
            cancel,
            ServiceError::is_transient,
            |_| {
                let synthesizer = Arc::clone(&self.synthesizer);
                let request = request.clone();
                async move {
                    let text = synthesizer.synthesize(request).await?;
                    if text.trim().is_empty() {
                        Err(ServiceError::EmptyOutput)
                    } else {
                        Ok(text)
                    }
                }
            },
        )
        .await
        .map_err(|err| service_failure(err, state.phase(), OrchestrationError::Synthesis))?;

        state.finish(response, reason)
    }
}

fn ensure_active(cancel: &CancellationToken, phase: OrchestrationPhase) -> Result<(), OrchestrationError> {
    if cancel.is_cancelled() {
        tracing::info!(phase = %phase, "Orchestration cancelled");
        return Err(OrchestrationError::Cancelled { phase });
    }
    Ok(())
}

/// Maps a service error, keeping cancellation distinct from failure.
fn service_failure(
    err: ServiceError,
    phase: OrchestrationPhase,
    wrap: fn(ServiceError) -> OrchestrationError,
) -> OrchestrationError {
    match err {
        ServiceError::Cancelled => OrchestrationError::Cancelled { phase },
        other => wrap(other),
    }
}

fn fail(error: OrchestrationError, state: OrchestrationState) -> OrchestrationFailure {
    tracing::error!(
        iteration = state.iteration(),
        phase = %state.phase(),
        error = %error,
        "Orchestration failed"
    );
    OrchestrationFailure::new(error, state)
}
