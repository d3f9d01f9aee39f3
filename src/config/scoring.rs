//! Path scoring configuration

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::domain::pathfinding::{ScoringPolicy, DEFAULT_CONDITION_BOOST};

use super::error::ValidationError;

/// Defaults for the `mechanistic_paths` scoring policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_length_penalty")]
    pub length_penalty: f64,

    #[serde(default = "default_multi_source_bonus")]
    pub multi_source_bonus: f64,

    #[serde(default = "default_min_evidence")]
    pub min_evidence: u32,

    /// Per-dataset weights in (0, 1]
    #[serde(default)]
    pub source_weights: HashMap<String, f64>,

    /// Multiplier for paths through a patient condition
    #[serde(default = "default_condition_boost")]
    pub condition_boost: f64,
}

impl ScoringConfig {
    pub fn policy(&self) -> Result<ScoringPolicy, ValidationError> {
        let weights: BTreeMap<String, f64> = self
            .source_weights
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        ScoringPolicy::new(weights, self.multi_source_bonus, self.length_penalty, self.min_evidence)
            .map_err(|e| ValidationError::InvalidScoring(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.policy()?;
        if !(self.condition_boost.is_finite() && self.condition_boost >= 1.0) {
            return Err(ValidationError::InvalidScoring(format!(
                "condition_boost must be at least 1, got {}",
                self.condition_boost
            )));
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            length_penalty: default_length_penalty(),
            multi_source_bonus: default_multi_source_bonus(),
            min_evidence: default_min_evidence(),
            source_weights: HashMap::new(),
            condition_boost: default_condition_boost(),
        }
    }
}

fn default_length_penalty() -> f64 {
    0.8
}

fn default_multi_source_bonus() -> f64 {
    1.2
}

fn default_min_evidence() -> u32 {
    1
}

fn default_condition_boost() -> f64 {
    DEFAULT_CONDITION_BOOST
}
