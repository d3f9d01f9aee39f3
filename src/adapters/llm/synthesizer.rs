//! LlmSynthesizer - writes the final answer from accumulated context.

use async_trait::async_trait;
use std::sync::Arc;

use crate::ports::{
    AIProvider, CompletionPurpose, CompletionRequest, FinishReason, MessageRole, RequestMetadata, ServiceError,
    SynthesisRequest, Synthesizer,
};

use super::prompts;

const SYNTHESIS_MAX_TOKENS: u32 = 2_048;

pub struct LlmSynthesizer {
    provider: Arc<dyn AIProvider>,
    temperature: f32,
}

impl LlmSynthesizer {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Synthesizer for LlmSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<String, ServiceError> {
        let system = prompts::synthesis_system();
        let budget = prompts::context_char_budget(
            self.provider.as_ref(),
            &format!("{}{}", system, request.query),
            SYNTHESIS_MAX_TOKENS,
        );
        let user = prompts::synthesis_user(&SynthesisRequest {
            accumulated_context: prompts::keep_tail(&request.accumulated_context, budget),
            ..request.clone()
        });

        let completion = self
            .provider
            .complete(
                CompletionRequest::new(RequestMetadata::new(request.query_id, CompletionPurpose::Synthesis, 0))
                    .with_system_prompt(system)
                    .with_message(MessageRole::User, user)
                    .with_max_tokens(SYNTHESIS_MAX_TOKENS)
                    .with_temperature(self.temperature),
            )
            .await?;

        let answer = completion.content.trim();
        if answer.is_empty() {
            return Err(ServiceError::EmptyOutput);
        }
        if completion.finish_reason == FinishReason::Length {
            tracing::warn!(
                query_id = %request.query_id,
                completion_tokens = completion.usage.completion_tokens,
                "Answer cut off at the token limit"
            );
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::foundation::QueryId;

    fn request() -> SynthesisRequest {
        SynthesisRequest {
            query_id: QueryId::new(),
            query: "What adverse events might metformin cause?".into(),
            accumulated_context: "# Evidence\n## drug_adverse_events (1 call(s))".into(),
        }
    }

    #[tokio::test]
    async fn returns_trimmed_answer() {
        let provider = Arc::new(MockAIProvider::new().with_response("  Lactic acidosis, nausea.\n"));
        let answer = LlmSynthesizer::new(provider.clone()).synthesize(request()).await.unwrap();

        assert_eq!(answer, "Lactic acidosis, nausea.");
        let calls = provider.get_calls();
        assert!(!calls[0].json_output);
        assert!(calls[0].messages[0].content.contains("# Evidence"));
    }

    #[tokio::test]
    async fn blank_answer_is_empty_output() {
        let provider = Arc::new(MockAIProvider::new().with_response("   "));
        let err = LlmSynthesizer::new(provider).synthesize(request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyOutput));
        assert!(!err.is_transient());
    }
}
