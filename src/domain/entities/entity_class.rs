//! Entity classes of the claim graph and their key normalization rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The classes of biomedical entity a claim can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Drug,
    Gene,
    Disease,
    AdverseEvent,
}

impl EntityClass {
    /// All classes in their canonical order.
    pub const ALL: [EntityClass; 4] = [
        EntityClass::Drug,
        EntityClass::Gene,
        EntityClass::Disease,
        EntityClass::AdverseEvent,
    ];

    /// Snake-case name used in tool arguments and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Drug => "drug",
            EntityClass::Gene => "gene",
            EntityClass::Disease => "disease",
            EntityClass::AdverseEvent => "adverse_event",
        }
    }

    /// Normalizes a free-text name or symbol into a lookup key.
    ///
    /// Genes are keyed by upper-cased symbol; every other class by the
    /// case-folded name. Surrounding whitespace is always trimmed.
    pub fn normalize_key(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self {
            EntityClass::Gene => trimmed.to_uppercase(),
            _ => trimmed.to_lowercase(),
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "drug" => Ok(EntityClass::Drug),
            "gene" => Ok(EntityClass::Gene),
            "disease" => Ok(EntityClass::Disease),
            "adverse_event" | "adverseevent" => Ok(EntityClass::AdverseEvent),
            other => Err(ValidationError::invalid_format(
                "entity_class",
                format!("unknown entity class '{}'", other),
            )),
        }
    }
}
