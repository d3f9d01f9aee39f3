//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - completion providers (Anthropic, OpenAI, failover, mock)
//! - `llm` - planner, evaluator and synthesizer built on a provider
//! - `graph` - in-memory claim graph loaded from fixture files

pub mod ai;
pub mod graph;
pub mod llm;

pub use ai::{AnthropicConfig, AnthropicProvider, FailoverAIProvider, MockAIProvider, OpenAIConfig, OpenAIProvider};
pub use graph::{GraphFixture, InMemoryClaimGraph};
pub use llm::{LlmEvaluator, LlmPlanner, LlmSynthesizer};
