//! LlmEvaluator - SufficiencyEvaluator backed by a completion provider.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::orchestration::{InformationGap, SufficiencyEvaluation, SufficiencyStatus};
use crate::domain::tools::ToolId;
use crate::ports::{
    AIProvider, CompletionPurpose, CompletionRequest, EvaluationRequest, MessageRole,
    RequestMetadata, ServiceError, SufficiencyEvaluator,
};

use super::json_extract::extract_json_object;
use super::prompts;

const EVALUATION_MAX_TOKENS: u32 = 1_024;

pub struct LlmEvaluator {
    provider: Arc<dyn AIProvider>,
}

impl LlmEvaluator {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self { provider }
    }

    fn build_request(&self, request: &EvaluationRequest) -> CompletionRequest {
        let system = prompts::evaluation_system();
        let fixed = prompts::evaluation_user(&EvaluationRequest {
            rolling_summary: String::new(),
            ..request.clone()
        });
        let budget = prompts::context_char_budget(
            self.provider.as_ref(),
            &format!("{}{}", system, fixed),
            EVALUATION_MAX_TOKENS,
        );
        let user = prompts::evaluation_user(&EvaluationRequest {
            rolling_summary: prompts::keep_tail(&request.rolling_summary, budget),
            ..request.clone()
        });

        CompletionRequest::new(RequestMetadata::new(
            request.query_id,
            CompletionPurpose::Evaluation,
            request.iteration,
        ))
        .with_system_prompt(system)
        .with_message(MessageRole::User, user)
        .with_max_tokens(EVALUATION_MAX_TOKENS)
        .with_temperature(0.0)
        .with_json_output()
    }
}

#[async_trait]
impl SufficiencyEvaluator for LlmEvaluator {
    async fn evaluate(&self, request: EvaluationRequest) -> Result<SufficiencyEvaluation, ServiceError> {
        let completion = self.provider.complete(self.build_request(&request)).await?;
        parse_evaluation(&completion.content)
    }
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    status: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    gaps: Vec<RawGap>,
    #[serde(default)]
    can_answer_now: bool,
}

#[derive(Debug, Deserialize)]
struct RawGap {
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Option<f64>,
    #[serde(default)]
    suggested_tool: Option<Value>,
}

fn default_category() -> String {
    "general".to_string()
}

/// Turns a completion into a validated evaluation.
///
/// Confidence is clamped into `[0, 1]`. A suggested tool outside the
/// catalogue is dropped.
pub fn parse_evaluation(completion: &str) -> Result<SufficiencyEvaluation, ServiceError> {
    let object = extract_json_object(completion)?;
    let raw: RawEvaluation = serde_json::from_value(Value::Object(object))
        .map_err(|e| ServiceError::contract_violation(format!("evaluation schema: {}", e)))?;

    let status: SufficiencyStatus = raw
        .status
        .parse()
        .map_err(|e| ServiceError::contract_violation(format!("{}", e)))?;

    if !raw.confidence.is_finite() {
        return Err(ServiceError::contract_violation("confidence is not a finite number"));
    }
    let confidence = raw.confidence.clamp(0.0, 1.0);

    let gaps = raw
        .gaps
        .into_iter()
        .map(|gap| {
            let priority = gap.priority.filter(|p| p.is_finite()).map(|p| p.round() as i32).unwrap_or(1);
            let mut info = InformationGap::new(gap.category, gap.description, priority);
            if let Some(tool) = gap
                .suggested_tool
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|name| name.parse::<ToolId>().ok())
            {
                info = info.suggesting(tool);
            }
            info
        })
        .collect();

    let evaluation = SufficiencyEvaluation::new(status, confidence, raw.reasoning)
        .map_err(|e| ServiceError::contract_violation(e.to_string()))?
        .with_gaps(gaps)
        .answerable_now(raw.can_answer_now);
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::foundation::QueryId;

    #[test]
    fn parses_sufficient_verdict() {
        let eval = parse_evaluation(
            r#"{"status": "sufficient", "confidence": 0.9, "reasoning": "84 adverse events found", "gaps": []}"#,
        )
        .unwrap();

        assert_eq!(eval.status, SufficiencyStatus::Sufficient);
        assert_eq!(eval.confidence(), 0.9);
        assert!(eval.is_sufficient());
        assert!(!eval.can_answer_now);
    }

    #[test]
    fn gaps_are_sorted_and_unknown_tools_dropped() {
        let eval = parse_evaluation(
            r#"{
                "status": "INSUFFICIENT",
                "confidence": 0.2,
                "reasoning": "drug not resolved",
                "gaps": [
                    {"category": "evidence", "description": "no claims", "priority": 2, "suggested_tool": "pubmed"},
                    {"category": "resolution", "description": "zorblax not found", "priority": 1, "suggested_tool": "resolve_drugs"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(eval.gaps[0].category, "resolution");
        assert_eq!(eval.gaps[0].suggested_tool, Some(ToolId::ResolveDrugs));
        assert_eq!(eval.gaps[1].suggested_tool, None);
    }

    #[test]
    fn confidence_is_clamped() {
        let eval = parse_evaluation(r#"{"status": "PARTIAL", "confidence": 1.7}"#).unwrap();
        assert_eq!(eval.confidence(), 1.0);
    }

    #[test]
    fn bad_status_is_contract_violation() {
        let err = parse_evaluation(r#"{"status": "MAYBE", "confidence": 0.5}"#).unwrap_err();
        assert!(matches!(err, ServiceError::ContractViolation(_)));
        assert!(parse_evaluation(r#"{"status": "PARTIAL"}"#).is_err());
    }

    #[tokio::test]
    async fn provider_errors_surface_as_provider_failures() {
        let provider = Arc::new(MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 1 }));
        let evaluator = LlmEvaluator::new(provider);

        let err = evaluator
            .evaluate(EvaluationRequest {
                query_id: QueryId::new(),
                query: "q".into(),
                iteration: 1,
                tool_outputs: "(no evidence gathered)".into(),
                rolling_summary: String::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Provider(_)));
        assert!(err.is_retryable());
    }
}
