//! Graph fixture files.
//!
//! A fixture lists entities and the claims between them. It is read from
//! JSON or YAML, picked by file extension:
//!
//! ```yaml
//! entities:
//!   - { class: drug, id: 14042, name: metformin, synonyms: [glucophage] }
//!   - { class: adverse_event, id: 501, name: lactic acidosis }
//! claims:
//!   - id: 1
//!     relation: reported_with
//!     subject: { class: drug, id: 14042 }
//!     object: { class: adverse_event, id: 501 }
//!     strength: 0.8
//!     source: faers
//!     evidence:
//!       - { id: "faers:1001", dataset: faers }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::entities::{EntityClass, EntityId};

/// Root of a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFixture {
    #[serde(default)]
    pub entities: Vec<EntityFixture>,

    #[serde(default)]
    pub claims: Vec<ClaimFixture>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFixture {
    pub class: EntityClass,
    pub id: EntityId,
    pub name: String,

    /// Extra names that resolve to this entity.
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// One end of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFixture {
    pub class: EntityClass,
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimFixture {
    pub id: i64,
    pub relation: String,
    pub subject: EndpointFixture,
    pub object: EndpointFixture,

    #[serde(default)]
    pub strength: Option<f64>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub evidence: Vec<EvidenceFixture>,
}

/// A provenance record backing a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceFixture {
    pub id: String,

    #[serde(default)]
    pub dataset: Option<String>,

    #[serde(default)]
    pub excerpt: Option<String>,

    #[serde(default)]
    pub reference: Option<String>,
}

/// Errors reading or validating a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Inconsistent fixture: {0}")]
    Inconsistent(String),
}

impl FixtureError {
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent(message.into())
    }
}

impl GraphFixture {
    /// Reads a fixture file. `.yaml` and `.yml` are parsed as YAML,
    /// anything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let fixture = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        tracing::info!(
            path = %path.display(),
            entities = fixture.entities.len(),
            claims = fixture.claims.len(),
            "Loaded graph fixture"
        );
        Ok(fixture)
    }

    pub fn from_json_str(content: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
entities:
  - { class: drug, id: 14042, name: metformin, synonyms: [glucophage] }
  - { class: adverse_event, id: 501, name: lactic acidosis }
claims:
  - id: 1
    relation: reported_with
    subject: { class: drug, id: 14042 }
    object: { class: adverse_event, id: 501 }
    strength: 0.8
    source: faers
    evidence:
      - { id: "faers:1001", dataset: faers }
"#;

    #[test]
    fn parses_yaml_fixture() {
        let fixture = GraphFixture::from_yaml_str(YAML).unwrap();

        assert_eq!(fixture.entities.len(), 2);
        assert_eq!(fixture.entities[0].synonyms, vec!["glucophage"]);
        assert_eq!(fixture.claims[0].object.class, EntityClass::AdverseEvent);
        assert_eq!(fixture.claims[0].evidence[0].dataset.as_deref(), Some("faers"));
    }

    #[test]
    fn optional_claim_fields_default() {
        let fixture = GraphFixture::from_json_str(
            r#"{"claims": [{"id": 3, "relation": "targets",
                "subject": {"class": "drug", "id": 1},
                "object": {"class": "gene", "id": 2}}]}"#,
        )
        .unwrap();

        assert!(fixture.entities.is_empty());
        assert_eq!(fixture.claims[0].strength, None);
        assert!(fixture.claims[0].evidence.is_empty());
    }

    #[test]
    fn extension_selects_format() {
        let mut yaml = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        yaml.write_all(YAML.as_bytes()).unwrap();
        assert_eq!(GraphFixture::from_path(yaml.path()).unwrap().claims.len(), 1);

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json.write_all(YAML.as_bytes()).unwrap();
        assert!(matches!(
            GraphFixture::from_path(json.path()).unwrap_err(),
            FixtureError::Json(_)
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GraphFixture::from_path("/nonexistent/graph.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/graph.json"));
    }
}
