//! Orchestration domain - state, phases and value objects of the
//! plan / execute / evaluate loop.
//!
//! The loop itself lives in the application layer; everything here is
//! synchronous and free of I/O.

mod digest;
mod errors;
mod evaluation;
mod phase;
mod state;
mod values;

pub use digest::iteration_digest;
pub use errors::{OrchestrationError, OrchestrationFailure};
pub use evaluation::{InformationGap, SufficiencyEvaluation, SufficiencyStatus};
pub use phase::OrchestrationPhase;
pub use state::{OrchestrationOutcome, OrchestrationState};
pub use values::{
    CompletionReason, IterationRecord, MaxIterations, OrchestrationMode, MAX_ITERATIONS_CAP,
};
