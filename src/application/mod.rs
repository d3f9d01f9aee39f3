//! Application layer - the orchestration loop and its command handler.
//!
//! This layer coordinates the domain with the ports: it executes tool
//! calls, retries service calls and drives each query to completion.

mod cancellation;
mod orchestrator;
mod retry;
mod tool_executor;

pub mod handlers;

pub use cancellation::{CancellationHandle, CancellationToken};
pub use handlers::{AnswerQuestionCommand, AnswerQuestionError, AnswerQuestionHandler};
pub use orchestrator::{OrchestrationSettings, Orchestrator};
pub use retry::{with_retry, RetryPolicy};
pub use tool_executor::ToolExecutor;
