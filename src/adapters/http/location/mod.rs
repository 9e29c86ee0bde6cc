//! HTTP adapter for location queries.
//!
//! - `POST /ask-for-location` - Answer a natural-language location query
//! - `POST /mcp` - Tool protocol over HTTP
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{ApiError, LocationAppState, DEFAULT_QUERY_TIMEOUT};
pub use routes::location_routes;
