//! LLM-backed planning, evaluation and synthesis services.
//!
//! Each service builds a prompt, calls an [`AIProvider`](crate::ports::AIProvider)
//! and validates the completion into a domain value. Anything that does
//! not fit the expected schema is a contract violation, which the
//! orchestrator retries.

mod evaluator;
mod json_extract;
mod planner;
mod prompts;
mod synthesizer;

pub use evaluator::{parse_evaluation, LlmEvaluator};
pub use json_extract::extract_json_object;
pub use planner::{parse_plan, LlmPlanner};
pub use synthesizer::LlmSynthesizer;
