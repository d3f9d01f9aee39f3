//! Claim Graph Port - one-hop expansion over the claim datastore.
//!
//! The path finder is written against this port only, so any datastore
//! that can list an entity's claims toward a class can back it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::{EntityClass, EntityId};

/// One claim connecting an entity to a neighbour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimEdge {
    pub claim_id: i64,
    /// Relation type, e.g. `targets` or `reported_with`.
    pub relation: String,
    pub neighbor_class: EntityClass,
    pub neighbor_id: EntityId,
    pub neighbor_label: String,
    /// Evidentiary strength in `[0, 1]` when the source provides one.
    pub strength: Option<f64>,
    /// Dataset the claim was ingested from.
    pub source: Option<String>,
}

/// Read-only access to claims around an entity.
#[async_trait]
pub trait ClaimGraph: Send + Sync {
    /// Claims from `(class, id)` to entities of `toward`, strongest first.
    async fn neighbors(
        &self,
        class: EntityClass,
        id: EntityId,
        toward: EntityClass,
    ) -> Result<Vec<ClaimEdge>, ClaimGraphError>;

    /// Display label of an entity, `None` if it does not exist.
    async fn entity_label(
        &self,
        class: EntityClass,
        id: EntityId,
    ) -> Result<Option<String>, ClaimGraphError>;
}

/// Failures of the claim datastore.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClaimGraphError {
    #[error("{class} {id} not found")]
    NotFound { class: EntityClass, id: EntityId },

    #[error("Claim graph unavailable: {0}")]
    Unavailable(String),
}

impl ClaimGraphError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity() {
        let err = ClaimGraphError::NotFound {
            class: EntityClass::Gene,
            id: 42,
        };
        assert_eq!(err.to_string(), "gene 42 not found");
    }

    #[test]
    fn claim_graph_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ClaimGraph>();
    }
}
