//! Tool Registry - the closed catalogue of graph query tools.
//!
//! The registry is immutable after construction and is shared read-only
//! across concurrent queries. Besides lookup it owns plan-time argument
//! typing: raw planner JSON is checked against each tool's declared
//! parameters before anything is executed.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::entities::EntityClass;

use super::tool_definition::DEFINITIONS;
use super::{
    ArgValue, EntityRef, ParamKind, ParamSpec, PlannedTool, Scalar, ToolArgs, ToolCall,
    ToolDefinition, ToolId, TOOL_CATALOGUE_VERSION,
};

/// A planned call whose arguments do not match the tool's signature.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallParseError {
    #[error("{tool}: missing required argument '{param}'")]
    MissingArgument { tool: ToolId, param: &'static str },

    #[error("{tool}: argument '{param}' {reason}")]
    InvalidArgument {
        tool: ToolId,
        param: String,
        reason: String,
    },
}

impl CallParseError {
    fn invalid(tool: ToolId, param: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            tool,
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

/// Registry of every tool definition, keyed by id.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: HashMap<ToolId, ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRegistry {
    /// The version-1 catalogue.
    pub fn standard() -> Self {
        Self {
            definitions: DEFINITIONS.iter().map(|d| (d.id, d.clone())).collect(),
        }
    }

    pub fn definition(&self, id: ToolId) -> Option<&ToolDefinition> {
        self.definitions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Planner-facing description of every tool, in catalogue order.
    pub fn catalogue(&self) -> String {
        let mut lines = vec![format!("Tool catalogue v{}:", TOOL_CATALOGUE_VERSION)];
        lines.extend(
            ToolId::ALL
                .iter()
                .filter_map(|id| self.definition(*id))
                .map(|def| format!("- {}", def.signature())),
        );
        lines.join("\n")
    }

    /// Types one planner call against the catalogue.
    ///
    /// Unknown tool names are preserved so the executor can report them.
    /// Argument names the tool does not declare are dropped.
    pub fn parse_call(
        &self,
        name: &str,
        raw_args: &Map<String, Value>,
        reason: Option<String>,
    ) -> Result<ToolCall, CallParseError> {
        let tool = PlannedTool::parse(name);
        let definition = match tool.known().and_then(|id| self.definition(id)) {
            Some(def) => def,
            None => {
                return Ok(ToolCall {
                    tool,
                    args: ToolArgs::new(),
                    reason,
                })
            }
        };

        let id = definition.id;
        let mut args = ToolArgs::new();

        // Class-name parameters first; dynamic entity slots depend on them.
        let mut classes: HashMap<&'static str, EntityClass> = HashMap::new();
        for spec in &definition.params {
            if spec.kind != ParamKind::EntityClassName {
                continue;
            }
            if let Some(value) = raw_args.get(spec.name).filter(|v| !v.is_null()) {
                let class = value
                    .as_str()
                    .ok_or_else(|| CallParseError::invalid(id, spec.name, "must be an entity class name"))?
                    .parse::<EntityClass>()
                    .map_err(|e| CallParseError::invalid(id, spec.name, e.to_string()))?;
                classes.insert(spec.name, class);
                args.insert(
                    spec.name,
                    ArgValue::Scalar {
                        value: Scalar::Text(class.as_str().to_string()),
                    },
                );
            }
        }

        for (key, value) in raw_args {
            if value.is_null() {
                continue;
            }
            let (spec, via_alias) = match definition.param(key) {
                Some(spec) => (spec, false),
                None => match definition.param_by_alias(key) {
                    Some(spec) => (spec, true),
                    None => {
                        tracing::warn!(tool = %id, argument = %key, "Dropping undeclared tool argument");
                        continue;
                    }
                },
            };
            if spec.kind == ParamKind::EntityClassName {
                continue;
            }
            let typed = type_argument(id, spec, value, via_alias, &classes)?;
            args.insert(spec.name, typed);
        }

        for spec in definition.params.iter().filter(|p| p.required) {
            if args.get(spec.name).is_none() {
                return Err(CallParseError::MissingArgument {
                    tool: id,
                    param: spec.name,
                });
            }
        }

        Ok(ToolCall {
            tool,
            args,
            reason,
        })
    }
}

fn type_argument(
    tool: ToolId,
    spec: &ParamSpec,
    value: &Value,
    via_alias: bool,
    classes: &HashMap<&'static str, EntityClass>,
) -> Result<ArgValue, CallParseError> {
    let invalid = |reason: &str| CallParseError::invalid(tool, spec.name, reason);

    match spec.kind {
        ParamKind::EntityId(class) => entity_slot(class, value, via_alias).map_err(|r| invalid(r)),
        ParamKind::DynamicEntityId { class_param } => {
            let class = classes
                .get(class_param)
                .copied()
                .ok_or_else(|| invalid("needs its class argument"))?;
            entity_slot(class, value, via_alias).map_err(|r| invalid(r))
        }
        ParamKind::EntityIds(class) => {
            let entities = match value {
                Value::Array(items) => items
                    .iter()
                    .map(entity_ref)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|r| invalid(r))?,
                single => vec![entity_ref(single).map_err(|r| invalid(r))?],
            };
            Ok(ArgValue::Entities { class, entities })
        }
        ParamKind::Text => match value {
            Value::String(s) => Ok(ArgValue::Scalar {
                value: Scalar::Text(s.trim().to_string()),
            }),
            _ => Err(invalid("must be a string")),
        },
        ParamKind::TextList => {
            let values = match value {
                Value::String(s) => vec![Scalar::Text(s.trim().to_string())],
                Value::Array(items) => items
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .map(|s| Scalar::Text(s.trim().to_string()))
                            .ok_or_else(|| invalid("must be a list of strings"))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(invalid("must be a list of strings")),
            };
            Ok(ArgValue::List { values })
        }
        ParamKind::Integer => {
            let parsed = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed
                .map(|v| ArgValue::Scalar {
                    value: Scalar::Int(v),
                })
                .ok_or_else(|| invalid("must be an integer"))
        }
        ParamKind::Number => value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| ArgValue::Scalar {
                value: Scalar::Float(v),
            })
            .ok_or_else(|| invalid("must be a finite number")),
        ParamKind::Flag => value
            .as_bool()
            .map(|v| ArgValue::Scalar {
                value: Scalar::Bool(v),
            })
            .ok_or_else(|| invalid("must be a boolean")),
        ParamKind::EntityClassName => Err(invalid("is handled separately")),
    }
}

/// Single-id slot; a list (or a plural alias) becomes `Entities` and is
/// split by the executor.
fn entity_slot(class: EntityClass, value: &Value, via_alias: bool) -> Result<ArgValue, &'static str> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err("must not be an empty list");
            }
            let entities = items.iter().map(entity_ref).collect::<Result<Vec<_>, _>>()?;
            Ok(ArgValue::Entities { class, entities })
        }
        single if via_alias => Ok(ArgValue::Entities {
            class,
            entities: vec![entity_ref(single)?],
        }),
        single => Ok(ArgValue::Entity {
            class,
            entity: entity_ref(single)?,
        }),
    }
}

fn entity_ref(value: &Value) -> Result<EntityRef, &'static str> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(EntityRef::from_integer)
            .ok_or("must be an integer identifier"),
        Value::String(s) if !s.trim().is_empty() => Ok(EntityRef::Name(s.trim().to_string())),
        _ => Err("must be an identifier, placeholder index or name"),
    }
}
