//! Orchestration loop configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::reasoning::ReasoningConfig;
use crate::application::OrchestrationConfig;

/// Upper bound accepted for `max_rounds`.
pub const MAX_ROUND_LIMIT: u32 = 32;

/// Round bound, retries and fan-out limits
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrationSettings {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Extra attempts for transiently failing tool calls
    #[serde(default = "default_backend_retries")]
    pub backend_retries: u32,

    /// Concurrent sibling tool calls (0 = unlimited)
    #[serde(default = "default_max_parallel_tools")]
    pub max_parallel_tools: usize,

    /// Upper bound on one engine call, retries included
    #[serde(default = "default_engine_timeout")]
    pub engine_timeout_secs: u64,

    /// Replaces the built-in system prompt
    pub system_prompt: Option<String>,
}

impl OrchestrationSettings {
    /// Loop settings, with sampling parameters taken from the reasoning section
    pub fn loop_config(&self, reasoning: &ReasoningConfig) -> OrchestrationConfig {
        let defaults = OrchestrationConfig::default();
        OrchestrationConfig {
            max_rounds: self.max_rounds,
            backend_retries: self.backend_retries,
            max_parallel_tools: self.max_parallel_tools,
            engine_timeout: Duration::from_secs(self.engine_timeout_secs),
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or(defaults.system_prompt),
            max_tokens: reasoning.max_tokens,
            temperature: reasoning.temperature,
        }
    }

    /// Validate orchestration configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_rounds == 0 || self.max_rounds > MAX_ROUND_LIMIT {
            return Err(ValidationError::InvalidRoundLimit {
                max: MAX_ROUND_LIMIT,
            });
        }
        if self.engine_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout(
                "orchestration.engine_timeout_secs",
            ));
        }
        Ok(())
    }
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            backend_retries: default_backend_retries(),
            max_parallel_tools: default_max_parallel_tools(),
            engine_timeout_secs: default_engine_timeout(),
            system_prompt: None,
        }
    }
}

fn default_max_rounds() -> u32 {
    8
}

fn default_backend_retries() -> u32 {
    1
}

fn default_max_parallel_tools() -> usize {
    4
}

fn default_engine_timeout() -> u64 {
    90
}
