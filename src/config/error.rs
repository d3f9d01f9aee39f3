//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Failed to install tracing subscriber: {0}")]
    Tracing(String),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("No AI provider configured")]
    NoAiProviderConfigured,

    #[error("Timeout must be positive: {0}")]
    InvalidTimeout(&'static str),

    #[error("max_iterations must be between 1 and {cap}, got {value}")]
    InvalidMaxIterations { value: u32, cap: u32 },

    #[error("{0} must be at least 1")]
    MustBePositive(&'static str),

    #[error("Invalid scoring policy: {0}")]
    InvalidScoring(String),

    #[error("Invalid log filter '{0}'")]
    InvalidLogFilter(String),
}
