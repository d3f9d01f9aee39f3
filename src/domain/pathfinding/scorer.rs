//! Path Scorer - deterministic ranking of mechanistic paths.
//!
//! All functions here are pure: the same paths and policy always produce
//! the same order and the same scores.

use serde::Serialize;
use std::cmp::Ordering;

use crate::domain::entities::{EntityClass, EntityId};

use super::{MechanisticPath, ScoringPolicy};

/// Individual factors of one path's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// `raw_score` times the source weight.
    pub base_score: f64,
    pub length_factor: f64,
    pub multi_source_factor: f64,
    /// 1.0 unless boosted for a patient condition.
    pub condition_factor: f64,
    pub final_score: f64,
}

/// A ranked path with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPath {
    pub path: MechanisticPath,
    pub score: f64,
}

/// A ranked path with every factor of its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainedPath {
    pub path: MechanisticPath,
    pub breakdown: ScoreBreakdown,
}

impl From<ExplainedPath> for ScoredPath {
    fn from(explained: ExplainedPath) -> Self {
        ScoredPath {
            score: explained.breakdown.final_score,
            path: explained.path,
        }
    }
}

/// Path scoring functions.
pub struct PathScorer;

impl PathScorer {
    /// Filters and ranks paths.
    ///
    /// # Algorithm
    /// 1. Drop paths with `evidence_count < min_evidence`
    /// 2. `score = raw_score × source_weight × length_penalty^hops`
    /// 3. `score ×= multi_source_bonus` when `evidence_count > 1`
    /// 4. Sort by score descending, then fewer hops, then input order
    pub fn score(paths: &[MechanisticPath], policy: &ScoringPolicy) -> Vec<ScoredPath> {
        Self::score_with_breakdown(paths, policy)
            .into_iter()
            .map(ScoredPath::from)
            .collect()
    }

    /// Same ranking as [`PathScorer::score`], keeping each factor.
    pub fn score_with_breakdown(paths: &[MechanisticPath], policy: &ScoringPolicy) -> Vec<ExplainedPath> {
        let explained: Vec<ExplainedPath> = paths
            .iter()
            .filter(|p| p.evidence_count() >= policy.min_evidence())
            .map(|p| ExplainedPath {
                breakdown: Self::breakdown(p, policy),
                path: p.clone(),
            })
            .collect();
        Self::sorted(explained)
    }

    /// Multiplies the score of every path touching one of `conditions`
    /// (disease ids) by `boost`, then re-sorts.
    ///
    /// Expects already scored input; ties keep their current order.
    pub fn rerank_for_conditions(
        ranked: Vec<ExplainedPath>,
        conditions: &[EntityId],
        boost: f64,
    ) -> Vec<ExplainedPath> {
        if conditions.is_empty() {
            return ranked;
        }
        let boosted = ranked
            .into_iter()
            .map(|mut e| {
                let matches = conditions
                    .iter()
                    .any(|id| e.path.contains(EntityClass::Disease, *id));
                if matches {
                    e.breakdown.condition_factor = boost;
                    e.breakdown.final_score *= boost;
                }
                e
            })
            .collect();
        Self::sorted(boosted)
    }

    fn breakdown(path: &MechanisticPath, policy: &ScoringPolicy) -> ScoreBreakdown {
        let base_score = path.raw_score() * policy.weight_for(path.sources());
        let length_factor = policy.length_penalty().powi(path.hops() as i32);
        let multi_source_factor = if path.evidence_count() > 1 {
            policy.multi_source_bonus()
        } else {
            1.0
        };
        ScoreBreakdown {
            base_score,
            length_factor,
            multi_source_factor,
            condition_factor: 1.0,
            final_score: base_score * length_factor * multi_source_factor,
        }
    }

    fn sorted(mut explained: Vec<ExplainedPath>) -> Vec<ExplainedPath> {
        // Stable sort keeps input order among exact ties.
        explained.sort_by(|a, b| {
            match b.breakdown.final_score.total_cmp(&a.breakdown.final_score) {
                Ordering::Equal => a.path.hops().cmp(&b.path.hops()),
                other => other,
            }
        });
        explained
    }
}
