//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the orchestration core and the outside world. Adapters implement them.
//!
//! ## Data Ports
//!
//! - `ClaimGraph` - Read access to typed claims between entities
//! - `ToolBackend` - Executes catalogue tools against a datastore
//!
//! ## Reasoning Ports
//!
//! - `AIProvider` - Raw text completion from an LLM
//! - `Planner` - Chooses the next tool calls
//! - `SufficiencyEvaluator` - Judges whether gathered evidence answers the query
//! - `Synthesizer` - Writes the final answer

mod ai_provider;
mod claim_graph;
mod services;
mod tool_backend;

pub use ai_provider::{
    AIError, AIProvider, CompletionPurpose, CompletionRequest, CompletionResponse, FinishReason,
    Message, MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use claim_graph::{ClaimEdge, ClaimGraph, ClaimGraphError};
pub use services::{
    EvaluationRequest, Planner, PlanningRequest, ServiceError, SufficiencyEvaluator,
    SynthesisRequest, Synthesizer,
};
pub use tool_backend::{ToolBackend, ToolExecutionError};
