//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `AI_MAPS` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use ai_maps::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}:{}", config.server.host, config.server.port);
//! ```

mod error;
mod maps;
mod orchestration;
mod reasoning;
mod server;

pub use error::{ConfigError, ValidationError};
pub use maps::MapsConfig;
pub use orchestration::{OrchestrationSettings, MAX_ROUND_LIMIT};
pub use reasoning::{ReasoningConfig, MAX_ENGINE_RETRIES};
pub use server::{LogFormat, ServerConfig};

use serde::Deserialize;
use std::time::Duration;

/// Plain variable honoured when `AI_MAPS__REASONING__API_KEY` is unset.
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

/// Plain variable honoured when `AI_MAPS__MAPS__API_KEY` is unset.
pub const GOOGLE_MAPS_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Reasoning engine configuration (OpenAI-compatible)
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Mapping backend configuration (Google Maps)
    #[serde(default)]
    pub maps: MapsConfig,

    /// Round bound, retries, fan-out
    #[serde(default)]
    pub orchestration: OrchestrationSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `AI_MAPS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Falls back to plain `OPENAI_API_KEY` / `GOOGLE_MAPS_API_KEY`
    ///
    /// # Environment Variable Format
    ///
    /// - `AI_MAPS__SERVER__PORT=8000` -> `server.port = 8000`
    /// - `AI_MAPS__ORCHESTRATION__MAX_ROUNDS=6` -> `orchestration.max_rounds = 6`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        // Defaults sit below every other source, so prefixed keys win.
        if let Ok(key) = std::env::var(OPENAI_KEY_VAR) {
            builder = builder.set_default("reasoning.api_key", key)?;
        }
        if let Ok(key) = std::env::var(GOOGLE_MAPS_KEY_VAR) {
            builder = builder.set_default("maps.api_key", key)?;
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix("AI_MAPS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate everything the HTTP server needs
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.reasoning.validate()?;
        self.validate_tools()
    }

    /// Validate what the tool protocol server needs (no reasoning engine)
    pub fn validate_tools(&self) -> Result<(), ValidationError> {
        self.maps.validate()?;
        self.orchestration.validate()?;
        Ok(())
    }

    /// Longest a query can take before the loop itself gives up.
    ///
    /// Every round may wait out the engine timeout plus one tool call that
    /// makes two backend requests (geocode, then search) with all retries.
    pub fn worst_case_query_time(&self) -> Duration {
        let attempts = self.orchestration.backend_retries.saturating_add(1);
        let tool_time = self
            .maps
            .timeout()
            .checked_mul(attempts.saturating_mul(2))
            .unwrap_or(Duration::MAX);
        Duration::from_secs(self.orchestration.engine_timeout_secs)
            .checked_add(tool_time)
            .and_then(|round| round.checked_mul(self.orchestration.max_rounds))
            .unwrap_or(Duration::MAX)
    }

    /// Whether the HTTP request deadline outlasts the loop's own bounds.
    ///
    /// When it does not, slow queries end with a request timeout instead of
    /// an engine timeout or round-limit error.
    pub fn request_timeout_covers_loop(&self) -> bool {
        self.server.request_timeout() >= self.worst_case_query_time()
    }
}

/// Renders a secret as its first five and last four characters.
///
/// Short values are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
