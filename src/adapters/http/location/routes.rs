//! Axum router configuration for the location service.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{ask_for_location, health, mcp, LocationAppState};

/// Create the location service router.
///
/// # Routes
/// - `POST /ask-for-location` - Answer a natural-language location query
/// - `POST /mcp` - JSON-RPC tool protocol, one session per request
/// - `GET /health` - Liveness probe
pub fn location_routes() -> Router<LocationAppState> {
    Router::new()
        .route("/ask-for-location", post(ask_for_location))
        .route("/mcp", post(mcp))
        .route("/health", get(health))
}
