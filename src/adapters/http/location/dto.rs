//! Data transfer objects for the location query endpoints.

use serde::{Deserialize, Serialize};

use crate::application::QueryAnswer;
use crate::domain::mapping::LocationSummary;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /ask-for-location`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskForLocationRequest {
    /// Natural-language question
    pub query: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Final answer to a location query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskForLocationResponse {
    pub answer: String,
    /// Engine rounds it took
    pub rounds: u32,
    /// Places and geocoded locations surfaced by tool results
    pub locations: Vec<LocationSummary>,
}

impl From<QueryAnswer> for AskForLocationResponse {
    fn from(answer: QueryAnswer) -> Self {
        Self {
            answer: answer.answer,
            rounds: answer.rounds,
            locations: answer.locations,
        }
    }
}

/// Liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body. Carries a generic message only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
