//! HTTP handlers for location queries and the protocol endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::adapters::protocol::ProtocolSession;
use crate::application::{MappingAdapter, OrchestrationError, OrchestrationLoop};

use super::dto::{AskForLocationRequest, AskForLocationResponse, ErrorResponse, HealthResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Default deadline for one location query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared, read-only dependencies cloned into every request.
#[derive(Clone)]
pub struct LocationAppState {
    pub orchestrator: Arc<OrchestrationLoop>,
    pub adapter: Arc<MappingAdapter>,
    /// Deadline for one `/ask-for-location` request.
    pub query_timeout: Duration,
}

impl LocationAppState {
    pub fn new(orchestrator: Arc<OrchestrationLoop>, adapter: Arc<MappingAdapter>) -> Self {
        Self {
            orchestrator,
            adapter,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /ask-for-location - Answer a natural-language location query
pub async fn ask_for_location(
    State(state): State<LocationAppState>,
    body: Result<Json<AskForLocationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| {
        warn!(error = %e, "Rejected query body");
        ApiError::BadRequest("request body must be JSON with a 'query' string".to_string())
    })?;

    // Dropping this handler (client gone, request timeout) cancels the loop.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let answer = tokio::time::timeout(
        state.query_timeout,
        state.orchestrator.run(&request.query, cancel),
    )
    .await
    .map_err(|_| ApiError::QueryTimeout(state.query_timeout))??;
    info!(
        query_id = %answer.query_id,
        rounds = answer.rounds,
        locations = answer.locations.len(),
        "Answered location query"
    );

    Ok(Json(AskForLocationResponse::from(answer)))
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

/// POST /mcp - One JSON-RPC exchange on a short-lived protocol session
pub async fn mcp(State(state): State<LocationAppState>, body: String) -> Response {
    let mut session = ProtocolSession::new(state.adapter.clone());
    if let Err(e) = session.attach_serving() {
        error!(error = %e, "Failed to open protocol session");
        return ApiError::Internal.into_response();
    }

    match session.handle_message(&body).await {
        Some(text) => ([(header::CONTENT_TYPE, "application/json")], text).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts query failures to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Orchestration(OrchestrationError),
    /// The query did not finish within the request deadline.
    QueryTimeout(Duration),
    Internal,
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::EmptyQuery => ApiError::BadRequest(err.to_string()),
            other => ApiError::Orchestration(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Orchestration(err) => {
                error!(error = %err, "Location query failed");
                match err {
                    OrchestrationError::ReasoningEngine(e) if e.is_timeout() => (
                        StatusCode::GATEWAY_TIMEOUT,
                        "The reasoning engine did not answer in time".to_string(),
                    ),
                    OrchestrationError::ReasoningEngine(_) => (
                        StatusCode::BAD_GATEWAY,
                        "The reasoning engine is unavailable".to_string(),
                    ),
                    OrchestrationError::LoopExceeded { .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Could not reach an answer for this query".to_string(),
                    ),
                    OrchestrationError::Cancelled => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "The query was cancelled".to_string(),
                    ),
                    OrchestrationError::EmptyQuery => {
                        (StatusCode::BAD_REQUEST, err.to_string())
                    }
                }
            }
            ApiError::QueryTimeout(after) => {
                warn!(timeout_ms = after.as_millis() as u64, "Location query hit the request deadline");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "The query did not finish in time".to_string(),
                )
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
