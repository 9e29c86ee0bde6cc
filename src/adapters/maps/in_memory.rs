//! In-memory mapping backend for testing.
//!
//! Answers from fixed tables keyed by normalized text, records every call,
//! and can inject failures or latency.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::mapping::{
    Coordinates, GeocodedLocation, MappingError, Place, PlaceDetails, Route,
};
use crate::ports::{DirectionsQuery, MappingBackend, PlaceSearch};

/// Fixed-table mapping backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMappingBackend {
    geocodes: HashMap<String, Vec<GeocodedLocation>>,
    reverse: HashMap<String, Vec<GeocodedLocation>>,
    places: HashMap<String, Vec<Place>>,
    details: HashMap<String, PlaceDetails>,
    routes: HashMap<(String, String), Vec<Route>>,
    /// Failures returned by the next calls, in order.
    queued_failures: Arc<Mutex<VecDeque<MappingError>>>,
    /// Failure returned by every call.
    failure: Option<MappingError>,
    /// Latency applied to every call.
    delay: Duration,
    /// Extra latency for calls whose key matches.
    key_delays: HashMap<String, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
    searches: Arc<Mutex<Vec<PlaceSearch>>>,
}

fn key(text: &str) -> String {
    text.trim().to_lowercase()
}

impl InMemoryMappingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geocode(mut self, address: &str, hits: Vec<GeocodedLocation>) -> Self {
        self.geocodes.insert(key(address), hits);
        self
    }

    pub fn with_reverse(mut self, point: Coordinates, hits: Vec<GeocodedLocation>) -> Self {
        self.reverse.insert(point.to_string(), hits);
        self
    }

    pub fn with_places(mut self, query: &str, places: Vec<Place>) -> Self {
        self.places.insert(key(query), places);
        self
    }

    pub fn with_details(mut self, details: PlaceDetails) -> Self {
        let id = details.place.place_id.clone().unwrap_or_default();
        self.details.insert(id, details);
        self
    }

    pub fn with_route(mut self, origin: &str, destination: &str, route: Route) -> Self {
        self.routes
            .entry((key(origin), key(destination)))
            .or_default()
            .push(route);
        self
    }

    /// Every call fails with `error`.
    pub fn with_failure(mut self, error: MappingError) -> Self {
        self.failure = Some(error);
        self
    }

    /// The next call fails with `error`; later calls proceed normally.
    pub fn with_queued_failure(self, error: MappingError) -> Self {
        self.queued_failures.lock().unwrap().push_back(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delays calls for one geocode address or search query.
    pub fn with_key_delay(mut self, text: &str, delay: Duration) -> Self {
        self.key_delays.insert(key(text), delay);
        self
    }

    /// Shared log of calls as `operation:argument` strings.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    /// Shared log of places searches.
    pub fn search_log(&self) -> Arc<Mutex<Vec<PlaceSearch>>> {
        Arc::clone(&self.searches)
    }

    async fn enter(&self, entry: String, lookup: &str) -> Result<(), MappingError> {
        self.calls.lock().unwrap().push(entry);

        let delay = self.delay + self.key_delays.get(&key(lookup)).copied().unwrap_or_default();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        if let Some(error) = self.queued_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MappingBackend for InMemoryMappingBackend {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodedLocation>, MappingError> {
        self.enter(format!("geocode:{}", address), address).await?;
        Ok(self.geocodes.get(&key(address)).cloned().unwrap_or_default())
    }

    async fn reverse_geocode(
        &self,
        point: Coordinates,
    ) -> Result<Vec<GeocodedLocation>, MappingError> {
        let point_key = point.to_string();
        self.enter(format!("reverse_geocode:{}", point_key), &point_key)
            .await?;
        Ok(self.reverse.get(&point_key).cloned().unwrap_or_default())
    }

    async fn search_places(&self, search: &PlaceSearch) -> Result<Vec<Place>, MappingError> {
        self.searches.lock().unwrap().push(search.clone());
        let entry = match search.center {
            Some(center) => format!("search_places:{}@{}", search.query, center),
            None => format!("search_places:{}", search.query),
        };
        self.enter(entry, &search.query).await?;
        Ok(self.places.get(&key(&search.query)).cloned().unwrap_or_default())
    }

    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, MappingError> {
        self.enter(format!("place_details:{}", place_id), place_id)
            .await?;
        Ok(self.details.get(place_id).cloned())
    }

    async fn directions(&self, query: &DirectionsQuery) -> Result<Vec<Route>, MappingError> {
        self.enter(
            format!("directions:{}->{}", query.origin, query.destination),
            &query.origin,
        )
        .await?;
        Ok(self
            .routes
            .get(&(key(&query.origin), key(&query.destination)))
            .map(|routes| {
                routes
                    .iter()
                    .filter(|route| route.mode == query.mode)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}
