//! Scripted AI provider for tests.
//!
//! Each call pops the next scripted reply, either text or an injected
//! error, and records the request so tests can inspect the prompts the
//! planner, evaluator and synthesizer actually sent. An exhausted script
//! answers with a fixed placeholder text.
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"tool_calls": []}"#)
//!     .with_error(MockError::RateLimited { retry_after_secs: 1 });
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Reply used once the script runs dry.
const EXHAUSTED_REPLY: &str = "Mock response";

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Error(MockError),
}

/// Provider failures a script can inject.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockAIProvider {
    script: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
    info: ProviderInfo,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// A poisoned lock only means another test thread panicked.
fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            info: ProviderInfo::new("mock", "mock-model-1", 128_000).with_json_mode(true),
        }
    }

    pub fn with_response(self, content: impl Into<String>) -> Self {
        locked(&self.script).push_back(MockResponse::Text(content.into()));
        self
    }

    pub fn with_error(self, error: MockError) -> Self {
        locked(&self.script).push_back(MockResponse::Error(error));
        self
    }

    /// Overrides the reported limits, e.g. a small context window.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| self.estimate_tokens(&m.content))
            .sum();
        locked(&self.calls).push(request);

        let next = locked(&self.script).pop_front();
        let content = match next {
            Some(MockResponse::Text(content)) => content,
            Some(MockResponse::Error(err)) => return Err(err.into()),
            None => EXHAUSTED_REPLY.to_string(),
        };
        Ok(CompletionResponse {
            usage: TokenUsage::new(prompt_tokens, self.estimate_tokens(&content)),
            content,
            model: self.info.model.clone(),
            finish_reason: FinishReason::Stop,
        })
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
