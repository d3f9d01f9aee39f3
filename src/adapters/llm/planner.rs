//! LlmPlanner - Planner backed by a completion provider.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::domain::tools::{PlanStop, ToolPlan, ToolRegistry};
use crate::ports::{
    AIProvider, CompletionPurpose, CompletionRequest, MessageRole, Planner, PlanningRequest,
    RequestMetadata, ServiceError,
};

use super::json_extract::extract_json_object;
use super::prompts;

const PLAN_MAX_TOKENS: u32 = 2_048;

/// Asks the model for the next tool calls and types them against the
/// registry.
pub struct LlmPlanner {
    provider: Arc<dyn AIProvider>,
    registry: Arc<ToolRegistry>,
    temperature: f32,
}

impl LlmPlanner {
    pub fn new(provider: Arc<dyn AIProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, request: &PlanningRequest) -> CompletionRequest {
        let system = prompts::planning_system(&self.registry.catalogue());
        let fixed = prompts::planning_user(&PlanningRequest {
            rolling_summary: String::new(),
            ..request.clone()
        });
        let budget = prompts::context_char_budget(
            self.provider.as_ref(),
            &format!("{}{}", system, fixed),
            PLAN_MAX_TOKENS,
        );
        let user = prompts::planning_user(&PlanningRequest {
            rolling_summary: prompts::keep_tail(&request.rolling_summary, budget),
            ..request.clone()
        });

        CompletionRequest::new(RequestMetadata::new(
            request.query_id,
            CompletionPurpose::Planning,
            request.iteration,
        ))
        .with_system_prompt(system)
        .with_message(MessageRole::User, user)
        .with_max_tokens(PLAN_MAX_TOKENS)
        .with_temperature(self.temperature)
        .with_json_output()
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, request: PlanningRequest) -> Result<ToolPlan, ServiceError> {
        let completion = self.provider.complete(self.build_request(&request)).await?;
        let plan = parse_plan(&self.registry, &completion.content)?;

        tracing::debug!(
            query_id = %request.query_id,
            iteration = request.iteration,
            calls = plan.calls.len(),
            stop = ?plan.stop,
            "Parsed plan"
        );
        Ok(plan)
    }
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    thought: Option<String>,
    #[serde(default, alias = "calls")]
    tool_calls: Vec<RawCall>,
    #[serde(default)]
    stop: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCall {
    #[serde(alias = "name")]
    tool: String,
    #[serde(default, alias = "arguments")]
    args: Map<String, Value>,
    #[serde(default)]
    reason: Option<String>,
}

/// Turns a completion into a typed plan.
///
/// Unknown tool names survive as unknown calls. Type errors on a known
/// tool reject the whole plan.
pub fn parse_plan(registry: &ToolRegistry, completion: &str) -> Result<ToolPlan, ServiceError> {
    let object = extract_json_object(completion)?;
    let raw: RawPlan = serde_json::from_value(Value::Object(object))
        .map_err(|e| ServiceError::contract_violation(format!("plan schema: {}", e)))?;

    let calls = raw
        .tool_calls
        .into_iter()
        .map(|call| {
            registry
                .parse_call(&call.tool, &call.args, call.reason)
                .map_err(|e| ServiceError::contract_violation(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let stop = match raw.stop.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => None,
        Some(s) if s.is_empty() || s == "null" || s == "none" => None,
        Some(s) if s == "sufficient" => Some(PlanStop::Sufficient),
        Some(s) if s == "no_relevant_tools" => Some(PlanStop::NoRelevantTools),
        Some(other) => {
            return Err(ServiceError::contract_violation(format!(
                "unknown stop condition '{}'",
                other
            )))
        }
    };

    Ok(ToolPlan {
        calls,
        thought: raw.thought.filter(|t| !t.trim().is_empty()),
        stop,
    })
}
