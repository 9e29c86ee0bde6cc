//! Mapping Backend Port - Interface for the geographic data provider.
//!
//! One method per provider operation. Implementations return typed domain
//! values; an empty `Vec` means the provider found nothing, which the
//! mapping adapter reports as a no-results outcome rather than an error.

use async_trait::async_trait;

use crate::domain::mapping::{
    Coordinates, GeocodedLocation, MappingError, Place, PlaceDetails, Route, TravelMode,
};

/// Parameters for a places search.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSearch {
    /// Free-text search terms.
    pub query: String,
    /// Center of a nearby search. `None` runs a plain text search.
    pub center: Option<Coordinates>,
    /// Radius in meters around `center`.
    pub radius_meters: u32,
}

/// Parameters for a directions request.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsQuery {
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
}

/// Port for mapping provider interactions.
#[async_trait]
pub trait MappingBackend: Send + Sync {
    /// Forward geocoding. Best match first.
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodedLocation>, MappingError>;

    /// Reverse geocoding. Most specific address first.
    async fn reverse_geocode(
        &self,
        point: Coordinates,
    ) -> Result<Vec<GeocodedLocation>, MappingError>;

    /// Places search, nearby when a center is given.
    async fn search_places(&self, search: &PlaceSearch) -> Result<Vec<Place>, MappingError>;

    /// Details for one place. `None` if the id is unknown.
    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, MappingError>;

    /// Routes between two locations. Preferred route first.
    async fn directions(&self, query: &DirectionsQuery) -> Result<Vec<Route>, MappingError>;

    /// Short provider name for logs.
    fn backend_name(&self) -> &'static str;
}
