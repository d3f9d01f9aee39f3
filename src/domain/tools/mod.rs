//! Tools domain - the closed catalogue of typed graph queries.
//!
//! - [`ToolId`] / [`PlannedTool`]: catalogue membership
//! - [`ToolDefinition`]: declared parameters and result shape
//! - [`ToolRegistry`]: lookup and plan-time argument typing
//! - [`ToolCall`] / [`ToolPlan`]: what a planner asks for
//! - [`ToolResult`] / [`Payload`]: what execution produced

mod normalize;
mod payload;
mod substitution;
mod tool_call;
mod tool_definition;
mod tool_id;
mod tool_registry;
mod tool_result;

pub use normalize::{split_plural, SplitArgs};
pub use payload::{Payload, Record};
pub use substitution::substitute_ref;
pub use tool_call::{
    ArgValue, ArgumentError, EntityRef, PlanStop, Scalar, ToolArgs, ToolCall, ToolPlan,
    PLACEHOLDER_INDEX_THRESHOLD,
};
pub use tool_definition::{ParamKind, ParamSpec, ResultShape, ToolDefinition};
pub use tool_id::{PlannedTool, ToolId, UnknownTool, TOOL_CATALOGUE_VERSION};
pub use tool_registry::{CallParseError, ToolRegistry};
pub use tool_result::{ToolFailureKind, ToolResult};
