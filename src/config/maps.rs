//! Mapping backend configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::mask_secret;
use crate::adapters::maps::GoogleMapsConfig;
use crate::application::MappingAdapterConfig;
use crate::domain::tools::DEFAULT_RADIUS_METERS;

/// Google Maps settings
#[derive(Debug, Clone, Deserialize)]
pub struct MapsConfig {
    /// API key (falls back to plain `GOOGLE_MAPS_API_KEY`)
    pub api_key: Option<Secret<String>>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_radius")]
    pub default_radius_meters: u32,

    #[serde(default = "default_max_radius")]
    pub max_radius_meters: u32,

    /// Result language (e.g. `en`, `pl`)
    pub language: Option<String>,
}

impl MapsConfig {
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

    /// Client settings for the Google Maps backend
    pub fn google_maps_config(&self) -> Result<GoogleMapsConfig, ValidationError> {
        let key = self
            .api_key
            .as_ref()
            .filter(|_| self.has_api_key())
            .ok_or(ValidationError::MissingRequired("GOOGLE_MAPS_API_KEY"))?;

        let mut config = GoogleMapsConfig::new(key.expose_secret().clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout());
        if let Some(language) = &self.language {
            config = config.with_language(language.clone());
        }
        Ok(config)
    }

    /// Settings for the mapping adapter
    pub fn adapter_config(&self) -> MappingAdapterConfig {
        MappingAdapterConfig {
            call_timeout: self.timeout(),
            default_radius_meters: self.default_radius_meters,
            max_radius_meters: self.max_radius_meters,
        }
    }

    /// Validate maps configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("GOOGLE_MAPS_API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl("maps.base_url"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("maps.timeout_secs"));
        }
        if self.default_radius_meters == 0 || self.default_radius_meters > self.max_radius_meters {
            return Err(ValidationError::InvalidRadius);
        }
        Ok(())
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            default_radius_meters: default_radius(),
            max_radius_meters: default_max_radius(),
            language: None,
        }
    }
}

fn default_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_radius() -> u32 {
    DEFAULT_RADIUS_METERS
}

fn default_max_radius() -> u32 {
    50_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> MapsConfig {
        MapsConfig {
            api_key: Some(Secret::new("AIzaSyTestKey123456".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_maps_defaults() {
        let config = MapsConfig::default();
        assert_eq!(config.default_radius_meters, 5000);
        assert_eq!(config.max_radius_meters, 50_000);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_radius_bounds() {
        let mut config = with_key();
        assert!(config.validate().is_ok());

        config.default_radius_meters = 60_000;
        assert_eq!(config.validate(), Err(ValidationError::InvalidRadius));

        config.default_radius_meters = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidRadius));
    }

    #[test]
    fn test_missing_key() {
        assert_eq!(
            MapsConfig::default().validate(),
            Err(ValidationError::MissingRequired("GOOGLE_MAPS_API_KEY"))
        );
    }

    #[test]
    fn test_adapter_config_carries_limits() {
        let config = MapsConfig {
            max_radius_meters: 20_000,
            timeout_secs: 3,
            ..with_key()
        };
        let adapter = config.adapter_config();
        assert_eq!(adapter.max_radius_meters, 20_000);
        assert_eq!(adapter.call_timeout, Duration::from_secs(3));
    }
}
