//! Orchestration loop configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::{OrchestrationSettings, RetryPolicy};
use crate::domain::orchestration::{MaxIterations, OrchestrationMode, MAX_ITERATIONS_CAP};

use super::error::ValidationError;

/// Loop budgets, per-call timeouts and retry behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrationConfig {
    /// Mode used when a caller does not pick one
    #[serde(default = "default_mode")]
    pub default_mode: OrchestrationMode,

    /// Overrides the mode's iteration budget
    pub max_iterations: Option<u32>,

    #[serde(default = "default_planning_timeout")]
    pub planning_timeout_secs: u64,

    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    #[serde(default = "default_evaluation_timeout")]
    pub evaluation_timeout_secs: u64,

    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_secs: u64,

    /// Retries after the first attempt of a planning, evaluation or
    /// synthesis call
    #[serde(default = "default_service_retries")]
    pub service_retries: u32,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Rows per tool kept when evidence is rendered into a prompt
    #[serde(default = "default_max_items")]
    pub max_items_per_tool: usize,
}

impl OrchestrationConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Budget for queries that do not set their own.
    pub fn budget(&self) -> Result<MaxIterations, ValidationError> {
        match self.max_iterations {
            Some(value) => MaxIterations::new(value).map_err(|_| ValidationError::InvalidMaxIterations {
                value,
                cap: MAX_ITERATIONS_CAP,
            }),
            None => Ok(MaxIterations::for_mode(self.default_mode)),
        }
    }

    /// Loop settings handed to the orchestrator.
    pub fn settings(&self) -> OrchestrationSettings {
        let backoff = Duration::from_millis(self.retry_backoff_ms);
        let policy = |secs| RetryPolicy::with_retries(self.service_retries, backoff, Duration::from_secs(secs));
        OrchestrationSettings {
            planning_retry: policy(self.planning_timeout_secs),
            evaluation_retry: policy(self.evaluation_timeout_secs),
            synthesis_retry: policy(self.synthesis_timeout_secs),
            max_items_per_tool: self.max_items_per_tool,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.budget()?;
        let timeouts = [
            ("orchestration.planning_timeout_secs", self.planning_timeout_secs),
            ("orchestration.tool_timeout_secs", self.tool_timeout_secs),
            ("orchestration.evaluation_timeout_secs", self.evaluation_timeout_secs),
            ("orchestration.synthesis_timeout_secs", self.synthesis_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ValidationError::InvalidTimeout(*name));
        }
        if self.max_items_per_tool == 0 {
            return Err(ValidationError::MustBePositive("orchestration.max_items_per_tool"));
        }
        Ok(())
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            max_iterations: None,
            planning_timeout_secs: default_planning_timeout(),
            tool_timeout_secs: default_tool_timeout(),
            evaluation_timeout_secs: default_evaluation_timeout(),
            synthesis_timeout_secs: default_synthesis_timeout(),
            service_retries: default_service_retries(),
            retry_backoff_ms: default_retry_backoff(),
            max_items_per_tool: default_max_items(),
        }
    }
}

fn default_mode() -> OrchestrationMode {
    OrchestrationMode::Interactive
}

fn default_planning_timeout() -> u64 {
    60
}

fn default_tool_timeout() -> u64 {
    30
}

fn default_evaluation_timeout() -> u64 {
    60
}

fn default_synthesis_timeout() -> u64 {
    120
}

fn default_service_retries() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_max_items() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_interactive_mode() {
        let config = OrchestrationConfig::default();
        assert_eq!(config.budget().unwrap().get(), 3);
        assert_eq!(config.tool_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn autonomous_mode_allows_ten_iterations() {
        let config = OrchestrationConfig {
            default_mode: OrchestrationMode::Autonomous,
            ..Default::default()
        };
        assert_eq!(config.budget().unwrap().get(), 10);
    }

    #[test]
    fn override_above_cap_fails_validation() {
        let config = OrchestrationConfig {
            max_iterations: Some(25),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMaxIterations { value: 25, cap: 20 })
        ));
    }

    #[test]
    fn zero_timeout_is_named() {
        let config = OrchestrationConfig {
            evaluation_timeout_secs: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("evaluation_timeout_secs"));
    }

    #[test]
    fn settings_carry_retry_budget_and_timeouts() {
        let config = OrchestrationConfig {
            service_retries: 1,
            ..Default::default()
        };
        let settings = config.settings();
        assert_eq!(settings.planning_retry.max_attempts, 2);
        assert_eq!(settings.synthesis_retry.attempt_timeout, Duration::from_secs(120));
        assert_eq!(settings.max_items_per_tool, 10);
    }
}
