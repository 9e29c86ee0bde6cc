//! Reasoning engine configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::mask_secret;
use crate::adapters::ai::OpenAIConfig;

/// Upper bound accepted for `max_retries`.
pub const MAX_ENGINE_RETRIES: u32 = 10;

/// OpenAI-compatible chat completion settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReasoningConfig {
    /// API key (falls back to plain `OPENAI_API_KEY`)
    pub api_key: Option<Secret<String>>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on retryable failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,
}

impl ReasoningConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Masked key for startup logs
    pub fn masked_api_key(&self) -> String {
        self.api_key
            .as_ref()
            .map(|k| mask_secret(k.expose_secret()))
            .unwrap_or_else(|| "<unset>".to_string())
    }

    /// Client settings for the OpenAI engine
    pub fn openai_config(&self) -> Result<OpenAIConfig, ValidationError> {
        let key = self
            .api_key
            .as_ref()
            .filter(|_| self.has_api_key())
            .ok_or(ValidationError::MissingRequired("OPENAI_API_KEY"))?;

        Ok(OpenAIConfig::new(key.expose_secret().clone())
            .with_model(self.model.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries))
    }

    /// Validate reasoning configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl("reasoning.base_url"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("reasoning.timeout_secs"));
        }
        if self.max_retries > MAX_ENGINE_RETRIES {
            return Err(ValidationError::InvalidRetries {
                field: "reasoning.max_retries",
                max: MAX_ENGINE_RETRIES,
            });
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ValidationError::InvalidTemperature);
            }
        }
        Ok(())
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            temperature: None,
            max_tokens: None,
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    2
}
