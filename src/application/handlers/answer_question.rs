//! AnswerQuestionHandler - Command handler for answering one question.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::domain::orchestration::{
    MaxIterations, OrchestrationFailure, OrchestrationMode, OrchestrationOutcome,
    OrchestrationState,
};

use super::super::{CancellationToken, Orchestrator};

/// Command to answer a natural-language question.
#[derive(Debug, Clone)]
pub struct AnswerQuestionCommand {
    pub query: String,
    pub mode: OrchestrationMode,
    /// Overrides the mode's default budget; validated into [1, 20].
    pub max_iterations: Option<u32>,
}

impl AnswerQuestionCommand {
    pub fn new(query: impl Into<String>, mode: OrchestrationMode) -> Self {
        Self {
            query: query.into(),
            mode,
            max_iterations: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    fn budget(&self) -> Result<MaxIterations, ValidationError> {
        match self.max_iterations {
            Some(value) => MaxIterations::new(value),
            None => Ok(MaxIterations::for_mode(self.mode)),
        }
    }
}

/// Errors that can occur when answering a question.
#[derive(Debug, Error)]
pub enum AnswerQuestionError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(#[from] ValidationError),

    #[error(transparent)]
    Orchestration(#[from] OrchestrationFailure),
}

/// Handler for answering questions.
pub struct AnswerQuestionHandler {
    orchestrator: Arc<Orchestrator>,
}

impl AnswerQuestionHandler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(&self, cmd: AnswerQuestionCommand) -> Result<OrchestrationOutcome, AnswerQuestionError> {
        self.handle_cancellable(cmd, &CancellationToken::never()).await
    }

    pub async fn handle_cancellable(
        &self,
        cmd: AnswerQuestionCommand,
        cancel: &CancellationToken,
    ) -> Result<OrchestrationOutcome, AnswerQuestionError> {
        let budget = cmd.budget()?;
        let state = OrchestrationState::new(&cmd.query, budget)?;
        Ok(self.orchestrator.run(state, cancel).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{OrchestrationSettings, ToolExecutor};
    use crate::domain::orchestration::SufficiencyEvaluation;
    use crate::domain::tools::{Payload, PlanStop, ToolArgs, ToolId, ToolPlan, ToolRegistry};
    use crate::ports::{
        EvaluationRequest, Planner, PlanningRequest, ServiceError, SufficiencyEvaluator,
        SynthesisRequest, Synthesizer, ToolBackend, ToolExecutionError,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct StoppingPlanner {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Planner for StoppingPlanner {
        async fn plan(&self, _: PlanningRequest) -> Result<ToolPlan, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolPlan::stopping(PlanStop::NoRelevantTools))
        }
    }

    struct UnusedEvaluator;

    #[async_trait]
    impl SufficiencyEvaluator for UnusedEvaluator {
        async fn evaluate(&self, _: EvaluationRequest) -> Result<SufficiencyEvaluation, ServiceError> {
            Err(ServiceError::contract_violation("not expected"))
        }
    }

    struct EchoSynthesizer;

    #[async_trait]
    impl Synthesizer for EchoSynthesizer {
        async fn synthesize(&self, request: SynthesisRequest) -> Result<String, ServiceError> {
            Ok(format!("No tool applies to: {}", request.query))
        }
    }

    struct NoBackend;

    #[async_trait]
    impl ToolBackend for NoBackend {
        async fn invoke(&self, tool: ToolId, _: &ToolArgs) -> Result<Payload, ToolExecutionError> {
            Err(ToolExecutionError::Unsupported(tool))
        }
    }

    fn handler(planner: Arc<StoppingPlanner>) -> AnswerQuestionHandler {
        let executor = ToolExecutor::new(
            Arc::new(ToolRegistry::standard()),
            Arc::new(NoBackend),
            Duration::from_secs(1),
        );
        let orchestrator = Orchestrator::new(
            planner,
            Arc::new(UnusedEvaluator),
            Arc::new(EchoSynthesizer),
            Arc::new(executor),
            OrchestrationSettings::default(),
        );
        AnswerQuestionHandler::new(Arc::new(orchestrator))
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_planning() {
        let planner = Arc::new(StoppingPlanner::default());
        let result = handler(planner.clone())
            .handle(AnswerQuestionCommand::new("   ", OrchestrationMode::Interactive))
            .await;

        assert!(matches!(result, Err(AnswerQuestionError::InvalidQuestion(_))));
        assert_eq!(planner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn budget_above_cap_is_rejected() {
        let planner = Arc::new(StoppingPlanner::default());
        let cmd = AnswerQuestionCommand::new("Does aspirin cause tinnitus?", OrchestrationMode::Autonomous)
            .with_max_iterations(21);

        let result = handler(planner).handle(cmd).await;
        assert!(matches!(result, Err(AnswerQuestionError::InvalidQuestion(_))));
    }

    #[tokio::test]
    async fn planner_stop_finishes_without_evaluation() {
        let planner = Arc::new(StoppingPlanner::default());
        let outcome = handler(planner.clone())
            .handle(AnswerQuestionCommand::new("What is the weather?", OrchestrationMode::Interactive))
            .await
            .unwrap();

        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.completion_reason.as_str(), "no_relevant_tools");
        assert!(outcome.final_response.contains("What is the weather?"));
        assert_eq!(planner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_planning() {
        let planner = Arc::new(StoppingPlanner::default());
        let (cancel_handle, token) = CancellationToken::new();
        cancel_handle.cancel();

        let result = handler(planner.clone())
            .handle_cancellable(
                AnswerQuestionCommand::new("Does metformin cause lactic acidosis?", OrchestrationMode::Interactive),
                &token,
            )
            .await;

        assert!(matches!(result, Err(AnswerQuestionError::Orchestration(_))));
        assert_eq!(planner.calls.load(Ordering::SeqCst), 0);
    }
}
