//! Tool Executor - runs one planned call against the backend.
//!
//! Every call comes back as a [`ToolResult`]; nothing raised by a tool
//! escapes this module. Steps per call:
//!
//! 1. Reject tools outside the catalogue
//! 2. Split plural values on single-id parameters into deferred calls
//! 3. Substitute placeholders from the session's resolved entities
//! 4. Invoke the backend under a per-call timeout, catching panics
//! 5. Merge resolution results into the resolved entities

use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::entities::{AddOutcome, EntityClass, ResolvedEntityMap};
use crate::domain::tools::{
    split_plural, Payload, ResultShape, ToolArgs, ToolCall, ToolFailureKind, ToolId, ToolRegistry,
    ToolResult,
};
use crate::ports::{ToolBackend, ToolExecutionError};

/// Executes planned calls; shared read-only between queries.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    backend: Arc<dyn ToolBackend>,
    call_timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, backend: Arc<dyn ToolBackend>, call_timeout: Duration) -> Self {
        Self {
            registry,
            backend,
            call_timeout,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Executes one call, mutating `resolved` only for resolution tools.
    pub async fn execute(&self, call: &ToolCall, resolved: &mut ResolvedEntityMap) -> ToolResult {
        let Some(tool) = call.tool.known() else {
            tracing::warn!(tool = %call.tool, "Plan referenced unknown tool");
            return ToolResult::failed(
                call.tool.clone(),
                call.args.clone(),
                ToolFailureKind::UnknownTool,
                format!("unknown tool: {}", call.tool),
            )
            .with_reason(call.reason.clone());
        };
        let Some(definition) = self.registry.definition(tool) else {
            return ToolResult::failed(
                call.tool.clone(),
                call.args.clone(),
                ToolFailureKind::UnknownTool,
                format!("tool {} is not registered", tool),
            )
            .with_reason(call.reason.clone());
        };

        let split = split_plural(definition, &call.args);
        let args_used = call.args.substituted(resolved);
        let started = Instant::now();

        let first_args = split.first.substituted(resolved);
        let mut payload = match self.invoke(tool, &first_args).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::info!(
                    tool = %tool,
                    args = %first_args,
                    error = %err,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call failed"
                );
                return ToolResult::failed(call.tool.clone(), args_used, err.kind(), err.to_string())
                    .with_reason(call.reason.clone());
            }
        };

        if let Some(class) = definition.resolves {
            merge_resolutions(resolved, class, &payload);
        }

        for deferred in &split.deferred {
            let deferred_args = deferred.substituted(resolved);
            match self.invoke(tool, &deferred_args).await {
                Ok(more) if definition.result == ResultShape::List => {
                    payload = payload.concat(more);
                }
                Ok(_) => {
                    tracing::warn!(tool = %tool, "Dropping deferred result of record-shaped tool");
                }
                Err(err) => {
                    tracing::warn!(
                        tool = %tool,
                        args = %deferred_args,
                        error = %err,
                        "Deferred call failed, skipping"
                    );
                }
            }
        }

        tracing::info!(
            tool = %tool,
            rows = payload.len(),
            deferred = split.deferred.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool call succeeded"
        );

        ToolResult::succeeded(call.tool.clone(), args_used, payload).with_reason(call.reason.clone())
    }

    async fn invoke(&self, tool: ToolId, args: &ToolArgs) -> Result<Payload, ToolExecutionError> {
        let call = AssertUnwindSafe(self.backend.invoke(tool, args)).catch_unwind();
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let message = panic_message(&*panic);
                tracing::error!(tool = %tool, panic = %message, "Tool backend panicked");
                Err(ToolExecutionError::system(format!("backend panicked: {}", message)))
            }
            Err(_) => Err(ToolExecutionError::Timeout(self.call_timeout.as_millis() as u64)),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Adds `name → id` pairs from a resolution payload.
///
/// Accepts a record of `name: id` pairs or a list of rows with `name` (or
/// `key`) and `id`. Anything else is ignored.
fn merge_resolutions(resolved: &mut ResolvedEntityMap, class: EntityClass, payload: &Payload) {
    let mut pairs: Vec<(String, i64)> = Vec::new();
    match payload {
        Payload::Record(record) => {
            pairs.extend(
                record
                    .iter()
                    .filter_map(|(name, id)| id.as_i64().map(|id| (name.clone(), id))),
            );
        }
        Payload::List(rows) => {
            for row in rows {
                let name = row.get("name").or_else(|| row.get("key")).and_then(Value::as_str);
                let id = row.get("id").and_then(Value::as_i64);
                if let (Some(name), Some(id)) = (name, id) {
                    pairs.push((name.to_string(), id));
                }
            }
        }
        Payload::Empty => {}
    }

    for (name, id) in pairs {
        match resolved.add(class, &name, id) {
            AddOutcome::Inserted => {
                tracing::debug!(class = %class, name = %name, id, "Resolved entity");
            }
            AddOutcome::Unchanged => {}
            AddOutcome::Conflict { kept, rejected } => {
                tracing::warn!(
                    class = %class,
                    name = %name,
                    kept,
                    rejected,
                    "Conflicting resolution ignored, keeping first id"
                );
            }
        }
    }
}
