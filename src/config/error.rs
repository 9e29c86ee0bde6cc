//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid log format: {0}")]
    InvalidLogFormat(String),

    #[error("Invalid base URL for {0}")]
    InvalidBaseUrl(&'static str),

    #[error("Round limit must be between 1 and {max}")]
    InvalidRoundLimit { max: u32 },

    #[error("Default search radius must be between 1 and the maximum radius")]
    InvalidRadius,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("Retry count for {field} must be at most {max}")]
    InvalidRetries { field: &'static str, max: u32 },
}
