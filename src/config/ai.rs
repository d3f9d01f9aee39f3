//! AI provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<SecretString>,

    /// Anthropic API key
    pub anthropic_api_key: Option<SecretString>,

    /// Primary AI provider
    #[serde(default = "default_provider")]
    pub primary_provider: AiProvider,

    /// Provider tried when the primary fails with a retryable error
    pub fallback_provider: Option<AiProvider>,

    /// Model override for Anthropic
    pub anthropic_model: Option<String>,

    /// Model override for OpenAI
    pub openai_model: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Transport-level retries inside one provider call
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAI,
    #[default]
    Anthropic,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_openai(&self) -> bool {
        has_key(&self.openai_api_key)
    }

    pub fn has_anthropic(&self) -> bool {
        has_key(&self.anthropic_api_key)
    }

    /// Whether the given provider has a key.
    pub fn is_configured(&self, provider: AiProvider) -> bool {
        match provider {
            AiProvider::OpenAI => self.has_openai(),
            AiProvider::Anthropic => self.has_anthropic(),
        }
    }

    /// Fallback provider, only when it has a key and differs from the
    /// primary.
    pub fn usable_fallback(&self) -> Option<AiProvider> {
        self.fallback_provider
            .filter(|p| *p != self.primary_provider && self.is_configured(*p))
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_openai() && !self.has_anthropic() {
            return Err(ValidationError::NoAiProviderConfigured);
        }

        match self.primary_provider {
            AiProvider::OpenAI if !self.has_openai() => {
                return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
            }
            AiProvider::Anthropic if !self.has_anthropic() => {
                return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
            }
            _ => {}
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("ai.timeout_secs"));
        }

        Ok(())
    }
}

fn has_key(key: &Option<SecretString>) -> bool {
    key.as_ref().is_some_and(|k| !k.expose_secret().trim().is_empty())
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            primary_provider: default_provider(),
            fallback_provider: None,
            anthropic_model: None,
            openai_model: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_provider() -> AiProvider {
    AiProvider::Anthropic
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> Option<SecretString> {
        Some(SecretString::new(value.to_string()))
    }

    #[test]
    fn defaults_favor_anthropic() {
        let config = AiConfig::default();
        assert_eq!(config.primary_provider, AiProvider::Anthropic);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn blank_key_does_not_count() {
        let config = AiConfig {
            anthropic_api_key: key("  "),
            ..Default::default()
        };
        assert!(!config.has_anthropic());
        assert!(matches!(config.validate(), Err(ValidationError::NoAiProviderConfigured)));
    }

    #[test]
    fn primary_needs_its_own_key() {
        let config = AiConfig {
            openai_api_key: key("sk-xxx"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))
        ));
    }

    #[test]
    fn fallback_requires_key_and_distinct_provider() {
        let mut config = AiConfig {
            anthropic_api_key: key("sk-ant-xxx"),
            fallback_provider: Some(AiProvider::OpenAI),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.usable_fallback(), None);

        config.openai_api_key = key("sk-xxx");
        assert_eq!(config.usable_fallback(), Some(AiProvider::OpenAI));

        config.fallback_provider = Some(AiProvider::Anthropic);
        assert_eq!(config.usable_fallback(), None);
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AiConfig {
            anthropic_api_key: key("sk-ant-very-secret"),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
