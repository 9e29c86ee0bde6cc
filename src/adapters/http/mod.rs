//! HTTP adapters - REST API implementations.
//!
//! The location module exposes the query endpoint, the tool protocol
//! endpoint and the health probe. [`app_router`] wraps them with tracing,
//! timeout and CORS layers.

pub mod location;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use location::{location_routes, ApiError, LocationAppState, DEFAULT_QUERY_TIMEOUT};

/// Slack given to handlers before the router-level timeout cuts a request.
const ROUTER_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Router-level settings.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Query deadline. Handlers answer with a JSON error when it expires;
    /// the router layer only fires after an extra grace period.
    pub request_timeout: Duration,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_QUERY_TIMEOUT,
            cors_origins: Vec::new(),
        }
    }
}

/// Build the complete application router.
pub fn app_router(state: LocationAppState, config: &RouterConfig) -> Router {
    location_routes()
        .with_state(state.with_query_timeout(config.request_timeout))
        .layer(TimeoutLayer::new(config.request_timeout + ROUTER_TIMEOUT_GRACE))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
