//! Failover AI Provider - falls back to a secondary provider on transient
//! errors.
//!
//! When the primary fails with a retryable error (rate limit, unavailable,
//! network, timeout) the same request is sent to the fallback. Permanent
//! errors such as bad credentials are returned as they are.
//!
//! # Example
//!
//! ```ignore
//! let primary = Arc::new(OpenAIProvider::new(openai_config)?);
//! let fallback = Arc::new(AnthropicProvider::new(anthropic_config)?);
//!
//! let provider = FailoverAIProvider::new(primary).with_fallback(fallback);
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo};

/// AI provider wrapper with automatic failover support.
pub struct FailoverAIProvider {
    primary: Arc<dyn AIProvider>,
    fallback: Option<Arc<dyn AIProvider>>,
    fallbacks_taken: AtomicU64,
}

impl FailoverAIProvider {
    pub fn new(primary: Arc<dyn AIProvider>) -> Self {
        Self {
            primary,
            fallback: None,
            fallbacks_taken: AtomicU64::new(0),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn AIProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// How many requests were served by the fallback so far.
    pub fn fallbacks_taken(&self) -> u64 {
        self.fallbacks_taken.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AIProvider for FailoverAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let err = match self.primary.complete(request.clone()).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        let fallback = match &self.fallback {
            Some(fallback) if err.is_retryable() => fallback,
            _ => return Err(err),
        };

        self.fallbacks_taken.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            primary = %self.primary.provider_info().name,
            fallback = %fallback.provider_info().name,
            query_id = %request.metadata.query_id,
            purpose = %request.metadata.purpose,
            reason = %err,
            "Primary provider failed, using fallback"
        );
        fallback.complete(request).await
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        self.primary.estimate_tokens(text)
    }

    fn provider_info(&self) -> ProviderInfo {
        self.primary.provider_info()
    }
}
