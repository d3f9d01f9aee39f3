//! Declared signatures of the catalogue tools.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::domain::entities::EntityClass;

use super::ToolId;

/// Declared type of one tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "class", rename_all = "snake_case")]
pub enum ParamKind {
    /// One identifier of the given class.
    EntityId(EntityClass),
    /// A list of identifiers of the given class.
    EntityIds(EntityClass),
    /// Identifier whose class is named by a sibling parameter.
    DynamicEntityId { class_param: &'static str },
    Text,
    TextList,
    Integer,
    Number,
    Flag,
    /// One of the entity class names.
    EntityClassName,
}

impl ParamKind {
    /// Short type label shown to planners.
    pub fn label(&self) -> String {
        match self {
            ParamKind::EntityId(class) => format!("{} id", class),
            ParamKind::EntityIds(class) => format!("list of {} ids", class),
            ParamKind::DynamicEntityId { class_param } => format!("id of class '{}'", class_param),
            ParamKind::Text => "string".to_string(),
            ParamKind::TextList => "list of strings".to_string(),
            ParamKind::Integer => "integer".to_string(),
            ParamKind::Number => "number".to_string(),
            ParamKind::Flag => "boolean".to_string(),
            ParamKind::EntityClassName => "entity class".to_string(),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    /// Plural spelling a planner may use for a single-id parameter,
    /// e.g. `drug_ids` for `drug_id`. Lists arriving through it are split
    /// into one call per identifier.
    pub plural_alias: Option<&'static str>,
    pub description: &'static str,
}

impl ParamSpec {
    fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            plural_alias: None,
            description,
        }
    }

    fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            plural_alias: None,
            description,
        }
    }

    fn splittable(mut self, alias: &'static str) -> Self {
        self.plural_alias = Some(alias);
        self
    }
}

/// Shape of a successful payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    List,
    Record,
}

/// Static description of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    pub id: ToolId,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub result: ResultShape,
    /// Entity class whose name→id mapping this tool returns.
    pub resolves: Option<EntityClass>,
}

impl ToolDefinition {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Finds the parameter a plural alias belongs to.
    pub fn param_by_alias(&self, alias: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.plural_alias == Some(alias))
    }

    pub fn is_resolution(&self) -> bool {
        self.resolves.is_some()
    }

    /// One catalogue line, e.g. `drug_targets(drug_id: drug id) -> list: ...`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let optional = if p.required { "" } else { "?" };
                format!("{}{}: {}", p.name, optional, p.kind.label())
            })
            .collect();
        let shape = match self.result {
            ResultShape::List => "list",
            ResultShape::Record => "record",
        };
        format!(
            "{}({}) -> {}: {}",
            self.id,
            params.join(", "),
            shape,
            self.description
        )
    }
}

fn resolution(id: ToolId, class: EntityClass, param: &'static str, what: &'static str) -> ToolDefinition {
    ToolDefinition {
        id,
        description: what,
        params: vec![ParamSpec::required(
            param,
            ParamKind::TextList,
            "names or symbols to look up",
        )],
        result: ResultShape::Record,
        resolves: Some(class),
    }
}

fn one_hop(id: ToolId, class: EntityClass, param: &'static str, alias: &'static str, what: &'static str) -> ToolDefinition {
    ToolDefinition {
        id,
        description: what,
        params: vec![
            ParamSpec::required(param, ParamKind::EntityId(class), "entity identifier or placeholder")
                .splittable(alias),
            ParamSpec::optional("limit", ParamKind::Integer, "maximum rows returned"),
        ],
        result: ResultShape::List,
        resolves: None,
    }
}

/// Catalogue definitions in `ToolId::ALL` order.
pub(crate) static DEFINITIONS: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    vec![
        resolution(
            ToolId::ResolveDrugs,
            EntityClass::Drug,
            "names",
            "map drug names to drug ids",
        ),
        resolution(
            ToolId::ResolveGenes,
            EntityClass::Gene,
            "symbols",
            "map gene symbols to gene ids",
        ),
        resolution(
            ToolId::ResolveDiseases,
            EntityClass::Disease,
            "names",
            "map disease names to disease ids",
        ),
        resolution(
            ToolId::ResolveAdverseEvents,
            EntityClass::AdverseEvent,
            "names",
            "map adverse event terms to adverse event ids",
        ),
        one_hop(
            ToolId::DrugAdverseEvents,
            EntityClass::Drug,
            "drug_id",
            "drug_ids",
            "adverse events reported for a drug",
        ),
        one_hop(
            ToolId::DrugTargets,
            EntityClass::Drug,
            "drug_id",
            "drug_ids",
            "genes targeted by a drug",
        ),
        one_hop(
            ToolId::GeneDiseases,
            EntityClass::Gene,
            "gene_id",
            "gene_ids",
            "diseases associated with a gene",
        ),
        one_hop(
            ToolId::DiseaseDrugs,
            EntityClass::Disease,
            "disease_id",
            "disease_ids",
            "drugs indicated for a disease",
        ),
        one_hop(
            ToolId::AdverseEventDrugs,
            EntityClass::AdverseEvent,
            "adverse_event_id",
            "adverse_event_ids",
            "drugs reported with an adverse event",
        ),
        ToolDefinition {
            id: ToolId::ClaimEvidence,
            description: "provenance records backing a claim",
            params: vec![ParamSpec::required(
                "claim_id",
                ParamKind::Integer,
                "claim identifier",
            )],
            result: ResultShape::List,
            resolves: None,
        },
        ToolDefinition {
            id: ToolId::MechanisticPaths,
            description: "ranked explanatory paths between two entities",
            params: vec![
                ParamSpec::required("source_class", ParamKind::EntityClassName, "class of the source entity"),
                ParamSpec::required(
                    "source_id",
                    ParamKind::DynamicEntityId { class_param: "source_class" },
                    "source entity identifier or placeholder",
                ),
                ParamSpec::required("target_class", ParamKind::EntityClassName, "class of the target entities"),
                ParamSpec::optional(
                    "target_id",
                    ParamKind::DynamicEntityId { class_param: "target_class" },
                    "specific target; all targets of the class when omitted",
                ),
                ParamSpec::optional("max_paths", ParamKind::Integer, "number of paths returned"),
                ParamSpec::optional(
                    "patient_conditions",
                    ParamKind::EntityIds(EntityClass::Disease),
                    "disease ids that boost matching paths",
                ),
            ],
            result: ResultShape::List,
            resolves: None,
        },
    ]
});
