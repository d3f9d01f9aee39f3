//! Tool execution result value object.

use serde::Serialize;
use std::fmt;

use super::{Payload, PlannedTool, ToolArgs};

/// Category of a failed tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailureKind {
    /// The plan named a tool outside the catalogue.
    UnknownTool,
    /// Arguments could not be read, including unresolved references.
    InvalidArguments,
    /// Referenced entity does not exist in the datastore.
    NotFound,
    /// The invocation exceeded its time budget.
    Timeout,
    /// Any other backend failure.
    Backend,
}

impl ToolFailureKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownTool => "unknown tool",
            Self::InvalidArguments => "invalid arguments",
            Self::NotFound => "entity not found",
            Self::Timeout => "tool call timed out",
            Self::Backend => "tool backend failure",
        }
    }
}

impl fmt::Display for ToolFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Uniform outcome of one executed call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub tool: PlannedTool,
    /// Arguments after placeholder substitution.
    pub args_used: ToolArgs,
    pub success: bool,
    pub payload: Option<Payload>,
    pub error: Option<String>,
    pub failure: Option<ToolFailureKind>,
    pub reason: Option<String>,
}

impl ToolResult {
    pub fn succeeded(tool: PlannedTool, args_used: ToolArgs, payload: Payload) -> Self {
        Self {
            tool,
            args_used,
            success: true,
            payload: Some(payload),
            error: None,
            failure: None,
            reason: None,
        }
    }

    pub fn failed(
        tool: PlannedTool,
        args_used: ToolArgs,
        kind: ToolFailureKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool,
            args_used,
            success: false,
            payload: None,
            error: Some(error.into()),
            failure: Some(kind),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    /// Rows returned; zero on failure.
    pub fn row_count(&self) -> usize {
        self.payload.as_ref().map(Payload::len).unwrap_or(0)
    }

    /// One-line status used in digests and evaluator input.
    pub fn status_line(&self) -> String {
        if self.success {
            format!("{}({}) -> ok, {} rows", self.tool, self.args_used, self.row_count())
        } else {
            format!(
                "{}({}) -> FAILED: {}",
                self.tool,
                self.args_used,
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
