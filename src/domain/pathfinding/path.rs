//! Mechanistic path value objects.

use serde::Serialize;

use crate::domain::entities::{EntityClass, EntityId};
use crate::domain::foundation::ValidationError;

/// One entity on a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStep {
    pub entity_class: EntityClass,
    pub entity_id: EntityId,
    pub label: String,
    /// Relation that led to this step; `None` only for the first step.
    pub incoming_edge_type: Option<String>,
}

impl PathStep {
    /// The starting step of a path.
    pub fn origin(entity_class: EntityClass, entity_id: EntityId, label: impl Into<String>) -> Self {
        Self {
            entity_class,
            entity_id,
            label: label.into(),
            incoming_edge_type: None,
        }
    }

    /// A step reached through `edge_type`.
    pub fn via(
        edge_type: impl Into<String>,
        entity_class: EntityClass,
        entity_id: EntityId,
        label: impl Into<String>,
    ) -> Self {
        Self {
            entity_class,
            entity_id,
            label: label.into(),
            incoming_edge_type: Some(edge_type.into()),
        }
    }
}

/// An ordered chain of claims from a source entity to a target entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MechanisticPath {
    steps: Vec<PathStep>,
    raw_score: f64,
    evidence_count: u32,
    /// Datasets the traversed claims came from.
    sources: Vec<String>,
}

impl MechanisticPath {
    /// Validates and builds a path.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if there are no steps
    /// - `InvalidFormat` if the first step has an incoming edge or a later
    ///   step lacks one
    /// - `OutOfRange` if `raw_score` is negative or not finite
    pub fn new(steps: Vec<PathStep>, raw_score: f64, evidence_count: u32) -> Result<Self, ValidationError> {
        let first = steps.first().ok_or_else(|| ValidationError::empty_field("steps"))?;
        if first.incoming_edge_type.is_some() {
            return Err(ValidationError::invalid_format(
                "steps",
                "first step must not have an incoming edge",
            ));
        }
        if steps.iter().skip(1).any(|s| s.incoming_edge_type.is_none()) {
            return Err(ValidationError::invalid_format(
                "steps",
                "every step after the first needs an incoming edge",
            ));
        }
        if !raw_score.is_finite() || raw_score < 0.0 {
            return Err(ValidationError::out_of_range("raw_score", 0.0, f64::MAX, raw_score));
        }
        Ok(Self {
            steps,
            raw_score,
            evidence_count,
            sources: Vec::new(),
        })
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn raw_score(&self) -> f64 {
        self.raw_score
    }

    pub fn evidence_count(&self) -> u32 {
        self.evidence_count
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn source(&self) -> &PathStep {
        &self.steps[0]
    }

    pub fn target(&self) -> &PathStep {
        &self.steps[self.steps.len() - 1]
    }

    pub fn contains(&self, class: EntityClass, id: EntityId) -> bool {
        self.steps
            .iter()
            .any(|s| s.entity_class == class && s.entity_id == id)
    }

    /// Arrow notation, e.g. `metformin -[targets]-> PRKAA1`.
    pub fn describe(&self) -> String {
        let mut out = self.steps[0].label.clone();
        for step in &self.steps[1..] {
            let edge = step.incoming_edge_type.as_deref().unwrap_or("?");
            out.push_str(&format!(" -[{}]-> {}", edge, step.label));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_hop() -> MechanisticPath {
        MechanisticPath::new(
            vec![
                PathStep::origin(EntityClass::Drug, 14042, "metformin"),
                PathStep::via("targets", EntityClass::Gene, 5562, "PRKAA1"),
                PathStep::via("associated_with", EntityClass::Disease, 4001, "type 2 diabetes"),
            ],
            0.7,
            2,
        )
        .unwrap()
    }

    #[test]
    fn hops_count_edges() {
        assert_eq!(two_hop().hops(), 2);
    }

    #[test]
    fn describe_uses_arrow_notation() {
        assert_eq!(
            two_hop().describe(),
            "metformin -[targets]-> PRKAA1 -[associated_with]-> type 2 diabetes"
        );
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            MechanisticPath::new(vec![], 0.5, 0),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn origin_with_incoming_edge_is_rejected() {
        let step = PathStep::via("targets", EntityClass::Gene, 1, "X");
        assert!(MechanisticPath::new(vec![step], 0.5, 1).is_err());
    }

    #[test]
    fn negative_score_is_rejected() {
        let step = PathStep::origin(EntityClass::Drug, 1, "x");
        assert!(MechanisticPath::new(vec![step], -0.1, 1).is_err());
    }

    #[test]
    fn contains_matches_class_and_id() {
        let path = two_hop();
        assert!(path.contains(EntityClass::Disease, 4001));
        assert!(!path.contains(EntityClass::Gene, 4001));
    }
}
