//! In-memory claim graph.
//!
//! Backs both the [`ClaimGraph`] port used by the path finder and the
//! [`ToolBackend`] port used by the executor. Loaded once from a
//! [`GraphFixture`] and read-only afterwards.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::domain::entities::{EntityClass, EntityId};
use crate::domain::pathfinding::{
    PathFinder, PathQuery, PathScorer, ScoringPolicy, DEFAULT_CONDITION_BOOST, DEFAULT_EDGE_STRENGTH,
};
use crate::domain::tools::{ArgumentError, Payload, Record, ToolArgs, ToolId};
use crate::ports::{ClaimEdge, ClaimGraph, ClaimGraphError, ToolBackend, ToolExecutionError};

use super::fixture::{ClaimFixture, EvidenceFixture, FixtureError, GraphFixture};

const DEFAULT_MAX_PATHS: i64 = 5;
const MAX_PATHS_CEILING: i64 = 50;

/// Adjacency key: entity plus the class of the neighbours wanted.
type AdjacencyKey = (EntityClass, EntityId, EntityClass);

/// Claim graph held entirely in memory.
#[derive(Debug)]
pub struct InMemoryClaimGraph {
    labels: HashMap<(EntityClass, EntityId), String>,
    names: HashMap<(EntityClass, String), EntityId>,
    claims: HashMap<i64, ClaimFixture>,
    adjacency: HashMap<AdjacencyKey, Vec<ClaimEdge>>,
    policy: ScoringPolicy,
    condition_boost: f64,
}

impl InMemoryClaimGraph {
    /// Builds the graph, indexing every claim in both directions.
    ///
    /// # Errors
    ///
    /// - `Inconsistent` for duplicate entity or claim ids, claims that
    ///   reference unknown entities, or strengths outside `[0, 1]`
    pub fn from_fixture(fixture: GraphFixture) -> Result<Self, FixtureError> {
        let mut labels = HashMap::new();
        let mut names = HashMap::new();

        for entity in fixture.entities {
            let key = (entity.class, entity.id);
            if labels.insert(key, entity.name.clone()).is_some() {
                return Err(FixtureError::inconsistent(format!(
                    "duplicate {} id {}",
                    entity.class, entity.id
                )));
            }
            for name in std::iter::once(&entity.name).chain(entity.synonyms.iter()) {
                let normalized = entity.class.normalize_key(name);
                if let Some(existing) = names.get(&(entity.class, normalized.clone())) {
                    if *existing != entity.id {
                        tracing::warn!(
                            class = %entity.class,
                            name = %name,
                            kept = *existing,
                            rejected = entity.id,
                            "Ambiguous fixture name, keeping first entity"
                        );
                    }
                    continue;
                }
                names.insert((entity.class, normalized), entity.id);
            }
        }

        let mut claims = HashMap::new();
        let mut adjacency: HashMap<AdjacencyKey, Vec<ClaimEdge>> = HashMap::new();

        for claim in fixture.claims {
            if let Some(strength) = claim.strength {
                if !(0.0..=1.0).contains(&strength) {
                    return Err(FixtureError::inconsistent(format!(
                        "claim {} strength {} is outside [0, 1]",
                        claim.id, strength
                    )));
                }
            }
            let ends = [claim.subject, claim.object];
            let mut ends_labels = Vec::with_capacity(2);
            for end in ends {
                let label = labels.get(&(end.class, end.id)).ok_or_else(|| {
                    FixtureError::inconsistent(format!(
                        "claim {} references unknown {} {}",
                        claim.id, end.class, end.id
                    ))
                })?;
                ends_labels.push(label.clone());
            }

            let edge = |to_class, to_id, to_label: &str| ClaimEdge {
                claim_id: claim.id,
                relation: claim.relation.clone(),
                neighbor_class: to_class,
                neighbor_id: to_id,
                neighbor_label: to_label.to_string(),
                strength: claim.strength,
                source: claim.source.clone(),
            };
            adjacency
                .entry((claim.subject.class, claim.subject.id, claim.object.class))
                .or_default()
                .push(edge(claim.object.class, claim.object.id, &ends_labels[1]));
            adjacency
                .entry((claim.object.class, claim.object.id, claim.subject.class))
                .or_default()
                .push(edge(claim.subject.class, claim.subject.id, &ends_labels[0]));

            let id = claim.id;
            if claims.insert(id, claim).is_some() {
                return Err(FixtureError::inconsistent(format!("duplicate claim id {}", id)));
            }
        }

        for edges in adjacency.values_mut() {
            edges.sort_by(|a, b| {
                let sa = a.strength.unwrap_or(DEFAULT_EDGE_STRENGTH);
                let sb = b.strength.unwrap_or(DEFAULT_EDGE_STRENGTH);
                sb.total_cmp(&sa).then(a.claim_id.cmp(&b.claim_id))
            });
        }

        Ok(Self {
            labels,
            names,
            claims,
            adjacency,
            policy: ScoringPolicy::default(),
            condition_boost: DEFAULT_CONDITION_BOOST,
        })
    }

    /// Replaces the policy used by `mechanistic_paths`.
    pub fn with_scoring(mut self, policy: ScoringPolicy, condition_boost: f64) -> Self {
        self.policy = policy;
        self.condition_boost = condition_boost;
        self
    }

    pub fn entity_count(&self) -> usize {
        self.labels.len()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    fn resolve(&self, class: EntityClass, inputs: &[String]) -> Payload {
        let mut record = Record::new();
        for input in inputs {
            if let Some(id) = self.names.get(&(class, class.normalize_key(input))) {
                record.insert(input.clone(), json!(id));
            }
        }
        tracing::debug!(class = %class, requested = inputs.len(), found = record.len(), "Resolved names");
        Payload::Record(record)
    }

    fn one_hop(
        &self,
        class: EntityClass,
        id: EntityId,
        toward: EntityClass,
        limit: Option<usize>,
    ) -> Result<Payload, ToolExecutionError> {
        if !self.labels.contains_key(&(class, id)) {
            return Err(ToolExecutionError::NotFound { class, id });
        }
        let edges = self
            .adjacency
            .get(&(class, id, toward))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let rows = edges
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|edge| {
                let mut row = Map::new();
                row.insert(format!("{}_id", class), json!(id));
                row.insert(format!("{}_id", toward), json!(edge.neighbor_id));
                row.insert(format!("{}_name", toward), json!(edge.neighbor_label));
                row.insert("relation".into(), json!(edge.relation));
                row.insert("claim_id".into(), json!(edge.claim_id));
                row.insert("strength".into(), json!(edge.strength));
                row.insert("source".into(), json!(edge.source));
                row.insert("evidence_ids".into(), json!(self.evidence_ids(edge.claim_id)));
                row
            })
            .collect();
        Ok(Payload::List(rows))
    }

    fn evidence_ids(&self, claim_id: i64) -> Vec<&str> {
        self.claims
            .get(&claim_id)
            .map(|c| c.evidence.iter().map(|e| e.id.as_str()).collect())
            .unwrap_or_default()
    }

    fn claim_evidence(&self, claim_id: i64) -> Payload {
        let Some(claim) = self.claims.get(&claim_id) else {
            tracing::debug!(claim_id, "No such claim");
            return Payload::List(Vec::new());
        };
        let rows = claim
            .evidence
            .iter()
            .map(|e: &EvidenceFixture| {
                let mut row = Map::new();
                row.insert("evidence_id".into(), json!(e.id));
                row.insert("claim_id".into(), json!(claim.id));
                row.insert("relation".into(), json!(claim.relation));
                row.insert("dataset".into(), json!(e.dataset.as_ref().or(claim.source.as_ref())));
                row.insert("excerpt".into(), json!(e.excerpt));
                row.insert("reference".into(), json!(e.reference));
                row
            })
            .collect();
        Payload::List(rows)
    }

    async fn mechanistic_paths(&self, args: &ToolArgs) -> Result<Payload, ToolExecutionError> {
        let source_class = class_arg(args, "source_class")?;
        let target_class = class_arg(args, "target_class")?;
        let max_paths = args
            .opt_integer("max_paths")?
            .unwrap_or(DEFAULT_MAX_PATHS)
            .clamp(1, MAX_PATHS_CEILING) as usize;
        let conditions = match args.get("patient_conditions") {
            Some(_) => args.entity_ids("patient_conditions")?,
            None => Vec::new(),
        };
        let query = PathQuery {
            source_class,
            source_id: args.entity_id("source_id")?,
            target_class,
            target_id: args.opt_entity_id("target_id")?,
            max_paths,
        };

        let candidates = PathFinder::new(self).find_paths(&query).await?;
        let ranked = PathScorer::rerank_for_conditions(
            PathScorer::score_with_breakdown(&candidates, &self.policy),
            &conditions,
            self.condition_boost,
        );

        tracing::debug!(
            source = %source_class,
            source_id = query.source_id,
            target = %target_class,
            candidates = candidates.len(),
            kept = ranked.len().min(max_paths),
            "Ranked mechanistic paths"
        );

        let rows = ranked
            .into_iter()
            .take(max_paths)
            .enumerate()
            .map(|(rank, explained)| {
                let path = &explained.path;
                let mut row = Map::new();
                row.insert("rank".into(), json!(rank + 1));
                row.insert("path".into(), json!(path.describe()));
                row.insert("source_id".into(), json!(path.source().entity_id));
                row.insert("target_id".into(), json!(path.target().entity_id));
                row.insert("target_name".into(), json!(path.target().label));
                row.insert("hops".into(), json!(path.hops()));
                row.insert("score".into(), json!(explained.breakdown.final_score));
                row.insert("evidence_count".into(), json!(path.evidence_count()));
                row.insert("dataset".into(), json!(path.sources()));
                row.insert(
                    "breakdown".into(),
                    serde_json::to_value(explained.breakdown).unwrap_or(Value::Null),
                );
                row
            })
            .collect();
        Ok(Payload::List(rows))
    }
}

fn class_arg(args: &ToolArgs, name: &str) -> Result<EntityClass, ArgumentError> {
    args.text(name)?.parse().map_err(|_| ArgumentError::WrongType {
        name: name.to_string(),
        expected: "entity class",
    })
}

fn limit_arg(args: &ToolArgs) -> Result<Option<usize>, ArgumentError> {
    match args.opt_integer("limit")? {
        None => Ok(None),
        Some(n) if n >= 0 => Ok(Some(n as usize)),
        Some(_) => Err(ArgumentError::WrongType {
            name: "limit".to_string(),
            expected: "non-negative integer",
        }),
    }
}

#[async_trait]
impl ClaimGraph for InMemoryClaimGraph {
    async fn neighbors(
        &self,
        class: EntityClass,
        id: EntityId,
        toward: EntityClass,
    ) -> Result<Vec<ClaimEdge>, ClaimGraphError> {
        Ok(self.adjacency.get(&(class, id, toward)).cloned().unwrap_or_default())
    }

    async fn entity_label(&self, class: EntityClass, id: EntityId) -> Result<Option<String>, ClaimGraphError> {
        Ok(self.labels.get(&(class, id)).cloned())
    }
}

#[async_trait]
impl ToolBackend for InMemoryClaimGraph {
    async fn invoke(&self, tool: ToolId, args: &ToolArgs) -> Result<Payload, ToolExecutionError> {
        use EntityClass::*;

        match tool {
            ToolId::ResolveDrugs => Ok(self.resolve(Drug, &args.texts("names")?)),
            ToolId::ResolveGenes => Ok(self.resolve(Gene, &args.texts("symbols")?)),
            ToolId::ResolveDiseases => Ok(self.resolve(Disease, &args.texts("names")?)),
            ToolId::ResolveAdverseEvents => Ok(self.resolve(AdverseEvent, &args.texts("names")?)),
            ToolId::DrugAdverseEvents => {
                self.one_hop(Drug, args.entity_id("drug_id")?, AdverseEvent, limit_arg(args)?)
            }
            ToolId::DrugTargets => self.one_hop(Drug, args.entity_id("drug_id")?, Gene, limit_arg(args)?),
            ToolId::GeneDiseases => self.one_hop(Gene, args.entity_id("gene_id")?, Disease, limit_arg(args)?),
            ToolId::DiseaseDrugs => {
                self.one_hop(Disease, args.entity_id("disease_id")?, Drug, limit_arg(args)?)
            }
            ToolId::AdverseEventDrugs => self.one_hop(
                AdverseEvent,
                args.entity_id("adverse_event_id")?,
                Drug,
                limit_arg(args)?,
            ),
            ToolId::ClaimEvidence => {
                let claim_id = args
                    .opt_integer("claim_id")?
                    .ok_or_else(|| ArgumentError::Missing("claim_id".to_string()))?;
                Ok(self.claim_evidence(claim_id))
            }
            ToolId::MechanisticPaths => self.mechanistic_paths(args).await,
        }
    }
}
