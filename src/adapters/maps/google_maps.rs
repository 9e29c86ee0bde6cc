//! Google Maps Backend - Implementation of MappingBackend for the Maps
//! Platform web services.
//!
//! Uses the JSON variants of the Geocoding, Places (Nearby Search, Text
//! Search, Details) and Directions APIs.
//!
//! # Status mapping
//!
//! | Provider status | Result |
//! |-----------------|--------|
//! | `OK` | parsed values |
//! | `ZERO_RESULTS`, `NOT_FOUND` | empty result |
//! | `INVALID_REQUEST` | `MappingError::InvalidArguments` |
//! | anything else | `MappingError::BackendError` carrying the status |

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::mapping::{
    Coordinates, GeocodedLocation, MappingError, Place, PlaceDetails, Review, Route, RouteStep,
    TravelMode,
};
use crate::ports::{DirectionsQuery, MappingBackend, PlaceSearch};

const DETAIL_FIELDS: &str = "place_id,name,formatted_address,geometry,rating,user_ratings_total,\
types,formatted_phone_number,international_phone_number,website,price_level,opening_hours,reviews";

/// Configuration for the Google Maps backend.
#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL (default: https://maps.googleapis.com/maps/api).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Preferred result language (e.g., "en").
    pub language: Option<String>,
}

impl GoogleMapsConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            timeout: Duration::from_secs(10),
            language: None,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the result language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Google Maps Platform backend.
pub struct GoogleMapsBackend {
    config: GoogleMapsConfig,
    client: Client,
}

impl GoogleMapsBackend {
    /// Creates a new backend with the given configuration.
    pub fn new(config: GoogleMapsConfig) -> Result<Self, MappingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MappingError::backend("transport", format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Sends a GET to one API endpoint and decodes the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, MappingError> {
        let url = format!("{}/{}/json", self.config.base_url, endpoint);
        let mut query: Vec<(&str, String)> = params.to_vec();
        if let Some(language) = &self.config.language {
            query.push(("language", language.clone()));
        }
        query.push(("key", self.config.api_key().to_string()));

        debug!(endpoint, "Google Maps request");
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MappingError::timeout(self.config.timeout)
                } else {
                    MappingError::backend("transport", e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MappingError::backend(status.as_u16().to_string(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MappingError::backend("malformed_response", e.without_url().to_string()))
    }
}

/// Classifies a provider status. `Ok(false)` means an empty result set.
fn check_status(status: &str, error_message: Option<&str>) -> Result<bool, MappingError> {
    let message = error_message.unwrap_or(status).to_string();
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" | "NOT_FOUND" => Ok(false),
        "INVALID_REQUEST" => Err(MappingError::invalid(message)),
        other => Err(MappingError::backend(other, message)),
    }
}

/// Removes HTML tags and common entities from direction instructions.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                // block elements separate words
                if !text.ends_with(' ') && !text.is_empty() {
                    text.push(' ');
                }
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn mode_from_str(mode: &str) -> TravelMode {
    mode.parse().unwrap_or_default()
}

#[async_trait]
impl MappingBackend for GoogleMapsBackend {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodedLocation>, MappingError> {
        let body: GeocodeResponse = self
            .get("geocode", &[("address", address.to_string())])
            .await?;
        if !check_status(&body.status, body.error_message.as_deref())? {
            return Ok(Vec::new());
        }
        Ok(body.results.into_iter().filter_map(GeocodeResult::into_location).collect())
    }

    async fn reverse_geocode(
        &self,
        point: Coordinates,
    ) -> Result<Vec<GeocodedLocation>, MappingError> {
        let body: GeocodeResponse = self
            .get("geocode", &[("latlng", point.to_string())])
            .await?;
        if !check_status(&body.status, body.error_message.as_deref())? {
            return Ok(Vec::new());
        }
        Ok(body.results.into_iter().filter_map(GeocodeResult::into_location).collect())
    }

    async fn search_places(&self, search: &PlaceSearch) -> Result<Vec<Place>, MappingError> {
        let body: PlacesResponse = match search.center {
            Some(center) => {
                self.get(
                    "place/nearbysearch",
                    &[
                        ("location", center.to_string()),
                        ("radius", search.radius_meters.to_string()),
                        ("keyword", search.query.clone()),
                    ],
                )
                .await?
            }
            None => {
                self.get("place/textsearch", &[("query", search.query.clone())])
                    .await?
            }
        };
        if !check_status(&body.status, body.error_message.as_deref())? {
            return Ok(Vec::new());
        }
        Ok(body.results.into_iter().map(PlaceResult::into_place).collect())
    }

    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, MappingError> {
        let body: DetailsResponse = self
            .get(
                "place/details",
                &[
                    ("place_id", place_id.to_string()),
                    ("fields", DETAIL_FIELDS.to_string()),
                ],
            )
            .await?;
        if !check_status(&body.status, body.error_message.as_deref())? {
            return Ok(None);
        }
        Ok(body.result.map(DetailsResult::into_details))
    }

    async fn directions(&self, query: &DirectionsQuery) -> Result<Vec<Route>, MappingError> {
        let body: DirectionsResponse = self
            .get(
                "directions",
                &[
                    ("origin", query.origin.clone()),
                    ("destination", query.destination.clone()),
                    ("mode", query.mode.as_str().to_string()),
                ],
            )
            .await?;
        if !check_status(&body.status, body.error_message.as_deref())? {
            return Ok(Vec::new());
        }
        Ok(body
            .routes
            .into_iter()
            .filter_map(|route| route.into_route(query.mode))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "google_maps"
    }
}

// ----- Google Maps API Types -----

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    fn into_coordinates(self) -> Option<Coordinates> {
        Coordinates::new(self.lat, self.lng).ok()
    }
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
    place_id: Option<String>,
}

impl GeocodeResult {
    fn into_location(self) -> Option<GeocodedLocation> {
        Some(GeocodedLocation {
            formatted_address: self.formatted_address,
            location: self.geometry.location.into_coordinates()?,
            place_id: self.place_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Default, Deserialize)]
struct OpeningHours {
    open_now: Option<bool>,
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: Option<String>,
    #[serde(default)]
    name: String,
    formatted_address: Option<String>,
    vicinity: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f32>,
    user_ratings_total: Option<u32>,
    #[serde(default)]
    types: Vec<String>,
    opening_hours: Option<OpeningHours>,
}

impl PlaceResult {
    fn into_place(self) -> Place {
        Place {
            place_id: self.place_id,
            name: self.name,
            address: self.formatted_address.or(self.vicinity),
            location: self.geometry.and_then(|g| g.location.into_coordinates()),
            rating: self.rating,
            user_ratings_total: self.user_ratings_total,
            types: self.types,
            open_now: self.opening_hours.and_then(|h| h.open_now),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    error_message: Option<String>,
    result: Option<DetailsResult>,
}

#[derive(Debug, Deserialize)]
struct DetailsReview {
    #[serde(default)]
    author_name: String,
    rating: Option<f32>,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    place_id: Option<String>,
    #[serde(default)]
    name: String,
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f32>,
    user_ratings_total: Option<u32>,
    #[serde(default)]
    types: Vec<String>,
    formatted_phone_number: Option<String>,
    international_phone_number: Option<String>,
    website: Option<String>,
    price_level: Option<u8>,
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    reviews: Vec<DetailsReview>,
}

impl DetailsResult {
    fn into_details(self) -> PlaceDetails {
        let hours = self.opening_hours.unwrap_or_default();
        PlaceDetails {
            place: Place {
                place_id: self.place_id,
                name: self.name,
                address: self.formatted_address,
                location: self.geometry.and_then(|g| g.location.into_coordinates()),
                rating: self.rating,
                user_ratings_total: self.user_ratings_total,
                types: self.types,
                open_now: hours.open_now,
            },
            phone: self.formatted_phone_number.or(self.international_phone_number),
            website: self.website,
            price_level: self.price_level,
            opening_hours: hours.weekday_text,
            reviews: self
                .reviews
                .into_iter()
                .map(|r| Review {
                    author: r.author_name,
                    rating: r.rating,
                    text: r.text,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(default)]
    text: String,
    #[serde(default)]
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Polyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsStep {
    #[serde(default)]
    html_instructions: String,
    distance: TextValue,
    duration: TextValue,
    travel_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    #[serde(default)]
    steps: Vec<DirectionsStep>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    summary: String,
    overview_polyline: Option<Polyline>,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

impl DirectionsRoute {
    fn into_route(self, requested: TravelMode) -> Option<Route> {
        let first = self.legs.first()?;
        let last = self.legs.last()?;
        let start_address = first.start_address.clone();
        let end_address = last.end_address.clone();
        let distance_meters: u64 = self.legs.iter().map(|l| l.distance.value).sum();
        let duration_seconds: u64 = self.legs.iter().map(|l| l.duration.value).sum();
        let (distance_text, duration_text) = if self.legs.len() == 1 {
            (first.distance.text.clone(), first.duration.text.clone())
        } else {
            (
                format!("{:.1} km", distance_meters as f64 / 1000.0),
                format!("{} mins", (duration_seconds + 59) / 60),
            )
        };
        let mode = self
            .legs
            .iter()
            .flat_map(|l| l.steps.iter())
            .find_map(|s| s.travel_mode.as_deref())
            .map(|m| mode_from_str(m))
            .unwrap_or(requested);

        let steps = self
            .legs
            .into_iter()
            .flat_map(|leg| leg.steps)
            .map(|step| RouteStep {
                instruction: strip_html(&step.html_instructions),
                distance: step.distance.text,
                duration: step.duration.text,
            })
            .collect();

        Some(Route {
            mode,
            summary: self.summary,
            start_address,
            end_address,
            distance_meters,
            distance_text,
            duration_seconds,
            duration_text,
            polyline: self.overview_polyline.map(|p| p.points),
            steps,
        })
    }
}
