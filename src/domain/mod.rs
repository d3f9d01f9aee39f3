//! Domain layer containing the orchestration core's types and pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, state machine)
//! - `entities` - Entity classes and the per-session resolution context
//! - `tools` - Closed tool catalogue, plans, arguments and results
//! - `pathfinding` - Mechanistic path enumeration and scoring
//! - `evidence` - Bounded evidence accumulation and provenance
//! - `orchestration` - Loop state, phases and evaluations

pub mod entities;
pub mod evidence;
pub mod foundation;
pub mod orchestration;
pub mod pathfinding;
pub mod tools;
