//! Path Finder - bounded enumeration of claim chains between entities.
//!
//! Paths follow fixed route templates: for each (source class, target
//! class) pair a list of intermediate class sequences, tried shortest
//! first. Expansion never revisits an entity, looks at no more than
//! `fan_out` claims per step and stops once `candidate_limit` complete
//! paths have been collected.

use std::collections::BTreeSet;

use crate::domain::entities::{EntityClass, EntityId};
use crate::ports::{ClaimEdge, ClaimGraph, ClaimGraphError};

use super::{MechanisticPath, PathStep};

/// Strength assumed for claims that carry none.
pub const DEFAULT_EDGE_STRENGTH: f64 = 0.5;

/// Longest path enumerated, in hops.
pub const MAX_HOPS: usize = 3;

/// What to search for.
#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    pub source_class: EntityClass,
    pub source_id: EntityId,
    pub target_class: EntityClass,
    /// Only paths ending here; every entity of `target_class` when `None`.
    pub target_id: Option<EntityId>,
    pub max_paths: usize,
}

/// Intermediate class sequences for a source/target pair.
pub fn route_templates(source: EntityClass, target: EntityClass) -> Vec<Vec<EntityClass>> {
    use EntityClass::*;

    match (source, target) {
        (Drug, Disease) => vec![vec![], vec![Gene], vec![Gene, Gene]],
        (Drug, AdverseEvent) => vec![vec![], vec![Gene], vec![Gene, Disease]],
        (Drug, Gene) => vec![vec![], vec![Gene]],
        (Gene, Disease) => vec![vec![], vec![Gene], vec![Drug, Gene]],
        (Drug, Drug) => vec![vec![Gene], vec![Disease]],
        (Disease, Drug) | (AdverseEvent, Drug) | (Gene, Drug) | (Disease, Gene) => {
            route_templates(target, source)
                .into_iter()
                .map(|mut t| {
                    t.reverse();
                    t
                })
                .collect()
        }
        _ => vec![vec![]],
    }
}

/// Partial path under construction.
#[derive(Debug, Clone)]
struct Trail {
    steps: Vec<PathStep>,
    edges: Vec<ClaimEdge>,
}

impl Trail {
    fn visited(&self, class: EntityClass, id: EntityId) -> bool {
        self.steps
            .iter()
            .any(|s| s.entity_class == class && s.entity_id == id)
    }

    fn extend(&self, edge: &ClaimEdge) -> Trail {
        let mut next = self.clone();
        next.steps.push(PathStep::via(
            edge.relation.clone(),
            edge.neighbor_class,
            edge.neighbor_id,
            edge.neighbor_label.clone(),
        ));
        next.edges.push(edge.clone());
        next
    }

    fn into_path(self) -> Option<MechanisticPath> {
        let strengths: Vec<f64> = self
            .edges
            .iter()
            .map(|e| e.strength.unwrap_or(DEFAULT_EDGE_STRENGTH))
            .collect();
        let raw = if strengths.is_empty() {
            0.0
        } else {
            strengths.iter().sum::<f64>() / strengths.len() as f64
        };
        let claims: BTreeSet<i64> = self.edges.iter().map(|e| e.claim_id).collect();
        let sources: BTreeSet<String> = self.edges.iter().filter_map(|e| e.source.clone()).collect();

        MechanisticPath::new(self.steps, raw.max(0.0), claims.len() as u32)
            .ok()
            .map(|p| p.with_sources(sources.into_iter().collect()))
    }
}

/// Enumerates candidate paths over a [`ClaimGraph`].
pub struct PathFinder<'a> {
    graph: &'a dyn ClaimGraph,
    fan_out: usize,
    candidate_factor: usize,
}

impl<'a> PathFinder<'a> {
    pub fn new(graph: &'a dyn ClaimGraph) -> Self {
        Self {
            graph,
            fan_out: 25,
            candidate_factor: 4,
        }
    }

    /// Claims followed per expansion step.
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out.max(1);
        self
    }

    /// Candidates collected per requested path before stopping.
    pub fn with_candidate_factor(mut self, factor: usize) -> Self {
        self.candidate_factor = factor.max(1);
        self
    }

    /// Finds unscored candidate paths, shortest templates first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the source entity does not exist
    /// - `Unavailable` if the datastore fails
    pub async fn find_paths(&self, query: &PathQuery) -> Result<Vec<MechanisticPath>, ClaimGraphError> {
        let label = self
            .graph
            .entity_label(query.source_class, query.source_id)
            .await?
            .ok_or(ClaimGraphError::NotFound {
                class: query.source_class,
                id: query.source_id,
            })?;

        let limit = query.max_paths.max(1).saturating_mul(self.candidate_factor);
        let origin = Trail {
            steps: vec![PathStep::origin(query.source_class, query.source_id, label)],
            edges: Vec::new(),
        };
        let mut found = Vec::new();

        for template in route_templates(query.source_class, query.target_class) {
            if template.len() + 1 > MAX_HOPS {
                continue;
            }
            let mut route = template.clone();
            route.push(query.target_class);

            let mut frontier = vec![origin.clone()];
            for (depth, next_class) in route.iter().enumerate() {
                let last_hop = depth + 1 == route.len();
                let mut next_frontier = Vec::new();

                for trail in &frontier {
                    let Some(tip) = trail.steps.last() else { continue };
                    let edges = self
                        .graph
                        .neighbors(tip.entity_class, tip.entity_id, *next_class)
                        .await?;

                    for edge in edges.iter().take(self.fan_out) {
                        if trail.visited(edge.neighbor_class, edge.neighbor_id) {
                            continue;
                        }
                        if last_hop && query.target_id.is_some_and(|t| t != edge.neighbor_id) {
                            continue;
                        }
                        next_frontier.push(trail.extend(edge));
                    }
                }
                frontier = next_frontier;
                if frontier.is_empty() {
                    break;
                }
            }

            for trail in frontier {
                if found.len() >= limit {
                    break;
                }
                if let Some(path) = trail.into_path() {
                    found.push(path);
                }
            }

            tracing::debug!(
                source = %query.source_class,
                target = %query.target_class,
                hops = template.len() + 1,
                candidates = found.len(),
                "Route template expanded"
            );

            if found.len() >= limit {
                break;
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Hand-built adjacency for finder tests.
    #[derive(Default)]
    struct TinyGraph {
        labels: HashMap<(EntityClass, EntityId), String>,
        edges: HashMap<(EntityClass, EntityId, EntityClass), Vec<ClaimEdge>>,
    }

    impl TinyGraph {
        fn entity(mut self, class: EntityClass, id: EntityId, label: &str) -> Self {
            self.labels.insert((class, id), label.to_string());
            self
        }

        fn claim(
            mut self,
            claim_id: i64,
            from: (EntityClass, EntityId),
            to: (EntityClass, EntityId),
            strength: Option<f64>,
        ) -> Self {
            let label = self.labels.get(&to).cloned().unwrap_or_default();
            self.edges
                .entry((from.0, from.1, to.0))
                .or_default()
                .push(ClaimEdge {
                    claim_id,
                    relation: "rel".into(),
                    neighbor_class: to.0,
                    neighbor_id: to.1,
                    neighbor_label: label,
                    strength,
                    source: None,
                });
            self
        }
    }

    #[async_trait]
    impl ClaimGraph for TinyGraph {
        async fn neighbors(
            &self,
            class: EntityClass,
            id: EntityId,
            toward: EntityClass,
        ) -> Result<Vec<ClaimEdge>, ClaimGraphError> {
            Ok(self.edges.get(&(class, id, toward)).cloned().unwrap_or_default())
        }

        async fn entity_label(
            &self,
            class: EntityClass,
            id: EntityId,
        ) -> Result<Option<String>, ClaimGraphError> {
            Ok(self.labels.get(&(class, id)).cloned())
        }
    }

    use EntityClass::{Disease, Drug, Gene};

    fn graph() -> TinyGraph {
        TinyGraph::default()
            .entity(Drug, 1, "metformin")
            .entity(Gene, 10, "PRKAA1")
            .entity(Disease, 100, "diabetes")
            .entity(Disease, 200, "cancer")
            .claim(1, (Drug, 1), (Disease, 100), Some(0.9))
            .claim(2, (Drug, 1), (Gene, 10), Some(0.6))
            .claim(3, (Gene, 10), (Disease, 100), None)
            .claim(4, (Gene, 10), (Disease, 200), Some(0.4))
    }

    fn query(target_id: Option<EntityId>) -> PathQuery {
        PathQuery {
            source_class: Drug,
            source_id: 1,
            target_class: Disease,
            target_id,
            max_paths: 10,
        }
    }

    #[tokio::test]
    async fn finds_direct_and_two_hop_paths() {
        let g = graph();
        let paths = PathFinder::new(&g).find_paths(&query(Some(100))).await.unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].hops(), 1);
        assert_eq!(paths[0].raw_score(), 0.9);
        assert_eq!(paths[1].hops(), 2);
        // mean of 0.6 and the 0.5 default
        assert!((paths[1].raw_score() - 0.55).abs() < 1e-12);
        assert_eq!(paths[1].evidence_count(), 2);
    }

    #[tokio::test]
    async fn open_target_reaches_every_disease() {
        let g = graph();
        let paths = PathFinder::new(&g).find_paths(&query(None)).await.unwrap();
        let targets: BTreeSet<EntityId> = paths.iter().map(|p| p.target().entity_id).collect();
        assert_eq!(targets, BTreeSet::from([100, 200]));
    }

    #[tokio::test]
    async fn candidate_limit_bounds_work() {
        let g = graph();
        let mut q = query(None);
        q.max_paths = 1;
        let paths = PathFinder::new(&g)
            .with_candidate_factor(1)
            .find_paths(&q)
            .await
            .unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[tokio::test]
    async fn unknown_source_is_not_found() {
        let g = graph();
        let mut q = query(None);
        q.source_id = 999;
        let err = PathFinder::new(&g).find_paths(&q).await.unwrap_err();
        assert_eq!(err, ClaimGraphError::NotFound { class: Drug, id: 999 });
    }

    #[test]
    fn reverse_templates_mirror_forward_ones() {
        assert_eq!(
            route_templates(Disease, Drug),
            vec![vec![], vec![Gene], vec![Gene, Gene]]
        );
        assert_eq!(
            route_templates(EntityClass::AdverseEvent, Drug),
            vec![vec![], vec![Gene], vec![Disease, Gene]]
        );
    }
}
