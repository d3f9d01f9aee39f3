//! Tool call, argument and plan value objects.
//!
//! Arguments are typed at plan-parse time against the tool's declared
//! parameters. Entity-valued parameters carry an [`EntityRef`] which may
//! still be a placeholder until the executor substitutes it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::entities::{EntityClass, EntityId};

use super::PlannedTool;

/// Integers strictly below this value in an entity slot are positional
/// placeholders rather than literal identifiers.
pub const PLACEHOLDER_INDEX_THRESHOLD: i64 = 100;

/// A literal, non-entity argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "'{}'", v),
            Scalar::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Reference to an entity inside a tool argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// A concrete database identifier.
    Literal(EntityId),
    /// The N-th identifier resolved for the slot's class.
    Index(usize),
    /// A name or symbol awaiting lookup.
    Name(String),
}

impl EntityRef {
    /// Classifies an integer found in an entity slot.
    pub fn from_integer(value: i64) -> Self {
        if (0..PLACEHOLDER_INDEX_THRESHOLD).contains(&value) {
            EntityRef::Index(value as usize)
        } else {
            EntityRef::Literal(value)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !matches!(self, EntityRef::Literal(_))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Literal(id) => write!(f, "{}", id),
            EntityRef::Index(i) => write!(f, "${}", i),
            EntityRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgValue {
    Scalar { value: Scalar },
    List { values: Vec<Scalar> },
    Entity { class: EntityClass, entity: EntityRef },
    Entities { class: EntityClass, entities: Vec<EntityRef> },
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(items: &[T]) -> String {
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        }
        match self {
            ArgValue::Scalar { value } => write!(f, "{}", value),
            ArgValue::List { values } => write!(f, "[{}]", join(values)),
            ArgValue::Entity { entity, .. } => write!(f, "{}", entity),
            ArgValue::Entities { entities, .. } => write!(f, "[{}]", join(entities)),
        }
    }
}

/// Problems reading an argument inside a tool implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgumentError {
    #[error("missing required argument '{0}'")]
    Missing(String),

    #[error("argument '{name}' has the wrong type: expected {expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("unresolved {class} reference '{name}'")]
    Unresolved { class: EntityClass, name: String },
}

/// Named arguments of one call, ordered by name for stable rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolArgs(BTreeMap<String, ArgValue>);

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut ArgValue)> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&self, name: &str) -> Result<&ArgValue, ArgumentError> {
        self.get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }

    /// Reads a single entity identifier.
    ///
    /// A name that was never resolved is an error; a positional index that
    /// could not be substituted is passed through as a literal.
    pub fn entity_id(&self, name: &str) -> Result<EntityId, ArgumentError> {
        match self.require(name)? {
            ArgValue::Entity { class, entity } => entity_ref_to_id(*class, entity),
            ArgValue::Entities { class, entities } if entities.len() == 1 => {
                entity_ref_to_id(*class, &entities[0])
            }
            _ => Err(ArgumentError::WrongType {
                name: name.to_string(),
                expected: "entity id",
            }),
        }
    }

    /// Reads an optional entity identifier.
    pub fn opt_entity_id(&self, name: &str) -> Result<Option<EntityId>, ArgumentError> {
        if self.get(name).is_none() {
            return Ok(None);
        }
        self.entity_id(name).map(Some)
    }

    /// Reads a list of entity identifiers; a single entity counts as one.
    pub fn entity_ids(&self, name: &str) -> Result<Vec<EntityId>, ArgumentError> {
        match self.require(name)? {
            ArgValue::Entity { class, entity } => Ok(vec![entity_ref_to_id(*class, entity)?]),
            ArgValue::Entities { class, entities } => entities
                .iter()
                .map(|e| entity_ref_to_id(*class, e))
                .collect(),
            _ => Err(ArgumentError::WrongType {
                name: name.to_string(),
                expected: "entity ids",
            }),
        }
    }

    /// Reads a list of text values; a single text counts as one.
    pub fn texts(&self, name: &str) -> Result<Vec<String>, ArgumentError> {
        let wrong = || ArgumentError::WrongType {
            name: name.to_string(),
            expected: "text list",
        };
        match self.require(name)? {
            ArgValue::Scalar { value: Scalar::Text(t) } => Ok(vec![t.clone()]),
            ArgValue::List { values } => values
                .iter()
                .map(|v| match v {
                    Scalar::Text(t) => Ok(t.clone()),
                    _ => Err(wrong()),
                })
                .collect(),
            _ => Err(wrong()),
        }
    }

    /// Reads a text value.
    pub fn text(&self, name: &str) -> Result<String, ArgumentError> {
        match self.require(name)? {
            ArgValue::Scalar { value: Scalar::Text(t) } => Ok(t.clone()),
            _ => Err(ArgumentError::WrongType {
                name: name.to_string(),
                expected: "text",
            }),
        }
    }

    /// Reads an optional integer.
    pub fn opt_integer(&self, name: &str) -> Result<Option<i64>, ArgumentError> {
        match self.get(name) {
            None => Ok(None),
            Some(ArgValue::Scalar { value: Scalar::Int(v) }) => Ok(Some(*v)),
            Some(_) => Err(ArgumentError::WrongType {
                name: name.to_string(),
                expected: "integer",
            }),
        }
    }
}

fn entity_ref_to_id(class: EntityClass, entity: &EntityRef) -> Result<EntityId, ArgumentError> {
    match entity {
        EntityRef::Literal(id) => Ok(*id),
        EntityRef::Index(i) => Ok(*i as EntityId),
        EntityRef::Name(name) => Err(ArgumentError::Unresolved {
            class,
            name: name.clone(),
        }),
    }
}

impl fmt::Display for ToolArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// A request to invoke one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub tool: PlannedTool,
    pub args: ToolArgs,
    pub reason: Option<String>,
}

impl ToolCall {
    pub fn new(tool: impl Into<PlannedTool>, args: ToolArgs) -> Self {
        Self {
            tool: tool.into(),
            args,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.tool, self.args)
    }
}

/// Why a planner declined to call any more tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStop {
    /// No catalogue tool can add relevant evidence.
    NoRelevantTools,
    /// The planner judges the gathered evidence already sufficient.
    Sufficient,
}

/// Ordered tool calls proposed for one iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolPlan {
    pub calls: Vec<ToolCall>,
    /// The planner's reasoning for this step.
    pub thought: Option<String>,
    pub stop: Option<PlanStop>,
}

impl ToolPlan {
    pub fn new(calls: Vec<ToolCall>) -> Self {
        Self {
            calls,
            thought: None,
            stop: None,
        }
    }

    pub fn stopping(stop: PlanStop) -> Self {
        Self {
            calls: Vec::new(),
            thought: None,
            stop: Some(stop),
        }
    }

    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = Some(thought.into());
        self
    }

    /// A stop signal only counts when the plan carries no calls.
    pub fn effective_stop(&self) -> Option<PlanStop> {
        if self.calls.is_empty() {
            self.stop
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::ToolId;

    fn drug(entity: EntityRef) -> ArgValue {
        ArgValue::Entity {
            class: EntityClass::Drug,
            entity,
        }
    }

    #[test]
    fn small_integers_are_placeholders() {
        assert_eq!(EntityRef::from_integer(0), EntityRef::Index(0));
        assert_eq!(EntityRef::from_integer(99), EntityRef::Index(99));
        assert_eq!(EntityRef::from_integer(100), EntityRef::Literal(100));
        assert_eq!(EntityRef::from_integer(-3), EntityRef::Literal(-3));
    }

    #[test]
    fn entity_id_reads_literal() {
        let args = ToolArgs::new().with("drug_id", drug(EntityRef::Literal(14042)));
        assert_eq!(args.entity_id("drug_id"), Ok(14042));
    }

    #[test]
    fn entity_id_rejects_unresolved_name() {
        let args = ToolArgs::new().with("drug_id", drug(EntityRef::Name("zorblax".into())));
        assert_eq!(
            args.entity_id("drug_id"),
            Err(ArgumentError::Unresolved {
                class: EntityClass::Drug,
                name: "zorblax".into()
            })
        );
    }

    #[test]
    fn missing_argument_is_reported_by_name() {
        let args = ToolArgs::new();
        assert_eq!(
            args.entity_id("gene_id"),
            Err(ArgumentError::Missing("gene_id".into()))
        );
        assert_eq!(args.opt_entity_id("gene_id"), Ok(None));
    }

    #[test]
    fn texts_accepts_single_text() {
        let args = ToolArgs::new().with(
            "names",
            ArgValue::Scalar {
                value: Scalar::Text("metformin".into()),
            },
        );
        assert_eq!(args.texts("names").unwrap(), vec!["metformin".to_string()]);
    }

    #[test]
    fn display_renders_placeholders_distinctly() {
        let call = ToolCall::new(
            ToolId::DrugTargets,
            ToolArgs::new().with("drug_id", drug(EntityRef::Index(0))),
        );
        assert_eq!(call.to_string(), "drug_targets(drug_id=$0)");
    }

    #[test]
    fn stop_is_ignored_when_calls_present() {
        let mut plan = ToolPlan::stopping(PlanStop::Sufficient);
        assert_eq!(plan.effective_stop(), Some(PlanStop::Sufficient));

        plan.calls.push(ToolCall::new(ToolId::DrugTargets, ToolArgs::new()));
        assert_eq!(plan.effective_stop(), None);
    }
}
