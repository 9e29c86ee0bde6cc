//! Mapping Adapter - runs one declared tool against the mapping backend.
//!
//! The adapter validates arguments through the tool registry, performs the
//! backend call under a timeout, and normalizes whatever comes back into a
//! [`MappingResult`]. It never retries; the orchestration loop owns retry
//! policy.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::mapping::{MappingError, MappingResult};
use crate::domain::tools::{
    GeocodeParams, GetDirectionsParams, MapTool, PlaceDetailsParams, ReverseGeocodeParams,
    SearchPlacesParams, ToolRegistry, DEFAULT_RADIUS_METERS, GEOCODE, GET_DIRECTIONS,
    GET_PLACE_DETAILS, REVERSE_GEOCODE, SEARCH_PLACES,
};
use crate::ports::{DirectionsQuery, MappingBackend, PlaceSearch};

/// Adapter settings.
#[derive(Debug, Clone)]
pub struct MappingAdapterConfig {
    /// Upper bound on each backend call.
    pub call_timeout: Duration,
    /// Search radius used when the caller gives none.
    pub default_radius_meters: u32,
    /// Largest search radius passed to the backend.
    pub max_radius_meters: u32,
}

impl Default for MappingAdapterConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            default_radius_meters: DEFAULT_RADIUS_METERS,
            max_radius_meters: 50_000,
        }
    }
}

/// Executes mapping tools and normalizes their results.
pub struct MappingAdapter {
    backend: Arc<dyn MappingBackend>,
    registry: &'static ToolRegistry,
    config: MappingAdapterConfig,
}

impl MappingAdapter {
    /// Creates an adapter over the process-wide mapping tool registry.
    pub fn new(backend: Arc<dyn MappingBackend>, config: MappingAdapterConfig) -> Self {
        Self {
            backend,
            registry: ToolRegistry::mapping_tools(),
            config,
        }
    }

    /// Returns the registry used to resolve tool names.
    pub fn registry(&self) -> &'static ToolRegistry {
        self.registry
    }

    /// Name of the backend serving the tools.
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Validates and runs one tool invocation.
    pub async fn invoke(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> Result<MappingResult, MappingError> {
        let tool = self.registry.parse_arguments(tool_name, arguments)?;
        self.execute(&tool).await
    }

    /// Runs an already validated tool.
    pub async fn execute(&self, tool: &MapTool) -> Result<MappingResult, MappingError> {
        match tool {
            MapTool::Geocode(params) => self.geocode(params).await,
            MapTool::ReverseGeocode(params) => self.reverse_geocode(params).await,
            MapTool::SearchPlaces(params) => self.search_places(params).await,
            MapTool::GetDirections(params) => self.directions(params).await,
            MapTool::GetPlaceDetails(params) => self.place_details(params).await,
        }
    }

    async fn geocode(&self, params: &GeocodeParams) -> Result<MappingResult, MappingError> {
        let hits = self
            .call(GEOCODE, self.backend.geocode(&params.address))
            .await?;
        if hits.is_empty() {
            return Err(MappingError::no_results(format!(
                "No location found for '{}'",
                params.address
            )));
        }
        Ok(MappingResult::geocoded(GEOCODE, &params.address, &hits))
    }

    async fn reverse_geocode(
        &self,
        params: &ReverseGeocodeParams,
    ) -> Result<MappingResult, MappingError> {
        let hits = self
            .call(REVERSE_GEOCODE, self.backend.reverse_geocode(params.point))
            .await?;
        if hits.is_empty() {
            return Err(MappingError::no_results(format!(
                "No address found at ({})",
                params.point
            )));
        }
        Ok(MappingResult::reverse_geocoded(
            REVERSE_GEOCODE,
            params.point,
            &hits,
        ))
    }

    async fn search_places(
        &self,
        params: &SearchPlacesParams,
    ) -> Result<MappingResult, MappingError> {
        let radius_meters = params.radius_meters(
            self.config.default_radius_meters,
            self.config.max_radius_meters,
        );
        if let Some(requested) = params.radius {
            if requested > f64::from(self.config.max_radius_meters) {
                warn!(
                    requested,
                    capped = radius_meters,
                    "Search radius exceeds maximum, capping"
                );
            }
        }

        let center = match &params.near {
            Some(near) => {
                let hits = self.call(SEARCH_PLACES, self.backend.geocode(near)).await?;
                match hits.first() {
                    Some(hit) => Some(hit.location),
                    None => {
                        return Err(MappingError::no_results(format!(
                            "Could not resolve location '{}'",
                            near
                        )))
                    }
                }
            }
            None => None,
        };

        let search = PlaceSearch {
            query: params.query.clone(),
            center,
            radius_meters,
        };
        let places = self
            .call(SEARCH_PLACES, self.backend.search_places(&search))
            .await?;
        if places.is_empty() {
            let scope = params
                .near
                .as_ref()
                .map(|n| format!(" near {}", n))
                .unwrap_or_default();
            return Err(MappingError::no_results(format!(
                "No places found for '{}'{}",
                params.query, scope
            )));
        }
        Ok(MappingResult::places(
            SEARCH_PLACES,
            &params.query,
            params.near.as_deref(),
            &places,
        ))
    }

    async fn directions(
        &self,
        params: &GetDirectionsParams,
    ) -> Result<MappingResult, MappingError> {
        let query = DirectionsQuery {
            origin: params.origin.clone(),
            destination: params.destination.clone(),
            mode: params.mode,
        };
        let routes = self
            .call(GET_DIRECTIONS, self.backend.directions(&query))
            .await?;
        match routes.first() {
            Some(route) => Ok(MappingResult::route(GET_DIRECTIONS, route)),
            None => Err(MappingError::no_results(format!(
                "No {} route found from {} to {}",
                params.mode, params.origin, params.destination
            ))),
        }
    }

    async fn place_details(
        &self,
        params: &PlaceDetailsParams,
    ) -> Result<MappingResult, MappingError> {
        let details = self
            .call(GET_PLACE_DETAILS, self.backend.place_details(&params.place_id))
            .await?;
        match details {
            Some(details) => Ok(MappingResult::place_details(GET_PLACE_DETAILS, &details)),
            None => Err(MappingError::no_results(format!(
                "No place found with id '{}'",
                params.place_id
            ))),
        }
    }

    /// Runs one backend call under the configured timeout.
    async fn call<T, F>(&self, tool: &str, fut: F) -> Result<T, MappingError>
    where
        F: Future<Output = Result<T, MappingError>>,
    {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MappingError::timeout(self.config.call_timeout)),
        };
        debug!(
            tool,
            backend = self.backend.backend_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Backend call finished"
        );
        outcome
    }
}
