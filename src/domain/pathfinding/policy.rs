//! Scoring policy value object.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::foundation::ValidationError;

/// Score multiplier for paths passing through a patient condition.
pub const DEFAULT_CONDITION_BOOST: f64 = 1.5;

/// Immutable parameters of one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringPolicy {
    source_weight: BTreeMap<String, f64>,
    multi_source_bonus: f64,
    length_penalty: f64,
    min_evidence: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            source_weight: BTreeMap::new(),
            multi_source_bonus: 1.2,
            length_penalty: 0.8,
            min_evidence: 1,
        }
    }
}

impl ScoringPolicy {
    /// Creates a validated policy.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `multi_source_bonus <= 1`, `length_penalty` is
    ///   outside `(0, 1]` or any source weight is outside `(0, 1]`
    pub fn new(
        source_weight: BTreeMap<String, f64>,
        multi_source_bonus: f64,
        length_penalty: f64,
        min_evidence: u32,
    ) -> Result<Self, ValidationError> {
        if !(multi_source_bonus.is_finite() && multi_source_bonus > 1.0) {
            return Err(ValidationError::out_of_range(
                "multi_source_bonus",
                1.0,
                f64::MAX,
                multi_source_bonus,
            ));
        }
        if !(length_penalty > 0.0 && length_penalty <= 1.0) {
            return Err(ValidationError::out_of_range("length_penalty", 0.0, 1.0, length_penalty));
        }
        for (source, weight) in &source_weight {
            if !(*weight > 0.0 && *weight <= 1.0) {
                return Err(ValidationError::out_of_range(
                    format!("source_weight.{}", source),
                    0.0,
                    1.0,
                    *weight,
                ));
            }
        }
        Ok(Self {
            source_weight,
            multi_source_bonus,
            length_penalty,
            min_evidence,
        })
    }

    pub fn multi_source_bonus(&self) -> f64 {
        self.multi_source_bonus
    }

    pub fn length_penalty(&self) -> f64 {
        self.length_penalty
    }

    pub fn min_evidence(&self) -> u32 {
        self.min_evidence
    }

    pub fn source_weights(&self) -> &BTreeMap<String, f64> {
        &self.source_weight
    }

    /// Smallest weight among the given sources that the policy knows about,
    /// 1.0 when none are weighted.
    pub fn weight_for<'a>(&self, sources: impl IntoIterator<Item = &'a String>) -> f64 {
        sources
            .into_iter()
            .filter_map(|s| self.source_weight.get(s).copied())
            .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.min(w))))
            .unwrap_or(1.0)
    }
}
