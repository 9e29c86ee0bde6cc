//! Typed mapping tools.
//!
//! Each declared tool has one variant with an explicit parameter struct.
//! Raw engine arguments are validated into these types at the registry
//! boundary, so the mapping adapter never sees an unchecked JSON object.

use serde::{Deserialize, Deserializer};

use crate::domain::foundation::ValidationError;
use crate::domain::mapping::{Coordinates, TravelMode};

use super::{ParamType, ToolDeclaration, ToolError};

pub const GEOCODE: &str = "geocode";
pub const REVERSE_GEOCODE: &str = "reverse_geocode";
pub const SEARCH_PLACES: &str = "search_places";
pub const GET_DIRECTIONS: &str = "get_directions";
pub const GET_PLACE_DETAILS: &str = "get_place_details";

/// Default search radius in meters.
pub const DEFAULT_RADIUS_METERS: u32 = 5_000;

/// Arguments for `geocode`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeocodeParams {
    pub address: String,
}

/// Arguments for `reverse_geocode`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseGeocodeParams {
    pub point: Coordinates,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReverseGeocode {
    lat: f64,
    lng: f64,
}

/// Arguments for `search_places`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchPlacesParams {
    pub query: String,
    #[serde(default, alias = "location")]
    pub near: Option<String>,
    #[serde(default)]
    pub radius: Option<f64>,
}

impl SearchPlacesParams {
    /// Effective search radius: `default_meters` when absent, capped to
    /// `max_meters`, never below one meter.
    pub fn radius_meters(&self, default_meters: u32, max_meters: u32) -> u32 {
        let requested = self
            .radius
            .map(|r| r.round() as u32)
            .unwrap_or(default_meters);
        requested.clamp(1, max_meters.max(1))
    }
}

/// Arguments for `get_directions`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetDirectionsParams {
    pub origin: String,
    pub destination: String,
    #[serde(default, deserialize_with = "deserialize_mode")]
    pub mode: TravelMode,
}

/// Arguments for `get_place_details`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceDetailsParams {
    pub place_id: String,
}

/// A validated mapping tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum MapTool {
    Geocode(GeocodeParams),
    ReverseGeocode(ReverseGeocodeParams),
    SearchPlaces(SearchPlacesParams),
    GetDirections(GetDirectionsParams),
    GetPlaceDetails(PlaceDetailsParams),
}

impl MapTool {
    /// Returns the declared tool name.
    pub fn name(&self) -> &'static str {
        match self {
            MapTool::Geocode(_) => GEOCODE,
            MapTool::ReverseGeocode(_) => REVERSE_GEOCODE,
            MapTool::SearchPlaces(_) => SEARCH_PLACES,
            MapTool::GetDirections(_) => GET_DIRECTIONS,
            MapTool::GetPlaceDetails(_) => GET_PLACE_DETAILS,
        }
    }

    /// Validates raw arguments for the named tool.
    pub fn parse(name: &str, arguments: &serde_json::Value) -> Result<Self, ToolError> {
        let arguments = normalize_arguments(name, arguments)?;
        let invalid = |e: serde_json::Error| ToolError::invalid(name, e);

        let tool = match name {
            GEOCODE => {
                let mut params: GeocodeParams =
                    serde_json::from_value(arguments).map_err(invalid)?;
                params.address = required_text(name, "address", &params.address)?;
                MapTool::Geocode(params)
            }
            REVERSE_GEOCODE => {
                let raw: RawReverseGeocode = serde_json::from_value(arguments).map_err(invalid)?;
                let point =
                    Coordinates::new(raw.lat, raw.lng).map_err(|e| ToolError::invalid(name, e))?;
                MapTool::ReverseGeocode(ReverseGeocodeParams { point })
            }
            SEARCH_PLACES => {
                let mut params: SearchPlacesParams =
                    serde_json::from_value(arguments).map_err(invalid)?;
                params.query = required_text(name, "query", &params.query)?;
                params.near = params
                    .near
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty());
                if let Some(radius) = params.radius {
                    if !radius.is_finite() || radius <= 0.0 {
                        return Err(ToolError::invalid(
                            name,
                            ValidationError::invalid_format("radius", "must be a positive number"),
                        ));
                    }
                }
                MapTool::SearchPlaces(params)
            }
            GET_DIRECTIONS => {
                let mut params: GetDirectionsParams =
                    serde_json::from_value(arguments).map_err(invalid)?;
                params.origin = required_text(name, "origin", &params.origin)?;
                params.destination = required_text(name, "destination", &params.destination)?;
                MapTool::GetDirections(params)
            }
            GET_PLACE_DETAILS => {
                let mut params: PlaceDetailsParams =
                    serde_json::from_value(arguments).map_err(invalid)?;
                params.place_id = required_text(name, "place_id", &params.place_id)?;
                MapTool::GetPlaceDetails(params)
            }
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };

        Ok(tool)
    }

    /// Declarations for every mapping tool, in listing order.
    pub fn declarations() -> Vec<ToolDeclaration> {
        let modes: Vec<&str> = TravelMode::ALL.iter().map(|m| m.as_str()).collect();

        vec![
            ToolDeclaration::new(
                GEOCODE,
                "Convert an address or place name into geographic coordinates.",
            )
            .with_parameter(
                "address",
                ParamType::String,
                "The address or place name to geocode (e.g. \"Main Square, Krakow\")",
                true,
            ),
            ToolDeclaration::new(
                REVERSE_GEOCODE,
                "Convert geographic coordinates into the nearest human-readable address.",
            )
            .with_parameter("lat", ParamType::Number, "Latitude in degrees (-90 to 90)", true)
            .with_parameter("lng", ParamType::Number, "Longitude in degrees (-180 to 180)", true),
            ToolDeclaration::new(
                SEARCH_PLACES,
                "Search for places such as restaurants, museums or parks, optionally near a location.",
            )
            .with_parameter(
                "query",
                ParamType::String,
                "What to search for (e.g. \"museums\", \"vegan restaurants\")",
                true,
            )
            .with_parameter(
                "near",
                ParamType::String,
                "The location to search around (e.g. \"Krakow, Poland\")",
                false,
            )
            .with_parameter(
                "radius",
                ParamType::Integer,
                "Search radius in meters (default 5000, capped at 50000)",
                false,
            )
            .with_default(serde_json::json!(DEFAULT_RADIUS_METERS)),
            ToolDeclaration::new(GET_DIRECTIONS, "Get a route between two locations.")
                .with_parameter(
                    "origin",
                    ParamType::String,
                    "The starting location (address or \"lat,lng\")",
                    true,
                )
                .with_parameter(
                    "destination",
                    ParamType::String,
                    "The destination location (address or \"lat,lng\")",
                    true,
                )
                .with_enum_parameter(
                    "mode",
                    "The transportation mode",
                    &modes,
                    TravelMode::default().as_str(),
                ),
            ToolDeclaration::new(
                GET_PLACE_DETAILS,
                "Get detailed information (address, phone, website, opening hours, reviews) about a place.",
            )
            .with_parameter(
                "place_id",
                ParamType::String,
                "The place identifier returned by search_places",
                true,
            ),
        ]
    }
}

/// Accepts an object, `null`, or an empty/JSON-encoded string.
fn normalize_arguments(
    tool: &str,
    arguments: &serde_json::Value,
) -> Result<serde_json::Value, ToolError> {
    match arguments {
        serde_json::Value::Object(_) => Ok(arguments.clone()),
        serde_json::Value::Null => Ok(serde_json::json!({})),
        serde_json::Value::String(raw) if raw.trim().is_empty() => Ok(serde_json::json!({})),
        serde_json::Value::String(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value @ serde_json::Value::Object(_)) => Ok(value),
            _ => Err(ToolError::invalid(tool, "arguments are not a valid JSON object")),
        },
        _ => Err(ToolError::invalid(tool, "arguments must be a JSON object")),
    }
}

fn required_text(tool: &str, field: &str, value: &str) -> Result<String, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::invalid(tool, ValidationError::empty_field(field)));
    }
    Ok(trimmed.to_string())
}

fn deserialize_mode<'de, D>(deserializer: D) -> Result<TravelMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(TravelMode::default()),
        Some(value) => value.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_geocode_and_trims() {
        let tool = MapTool::parse(GEOCODE, &json!({"address": "  Krakow  "})).unwrap();
        assert_eq!(
            tool,
            MapTool::Geocode(GeocodeParams {
                address: "Krakow".to_string()
            })
        );
        assert_eq!(tool.name(), "geocode");
    }

    #[test]
    fn geocode_requires_address() {
        let err = MapTool::parse(GEOCODE, &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref reason, .. } if reason.contains("address")));
    }

    #[test]
    fn geocode_rejects_blank_address() {
        let err = MapTool::parse(GEOCODE, &json!({"address": "   "})).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = MapTool::parse(GEOCODE, &json!({"address": "x", "zoom": 3})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn reverse_geocode_checks_ranges() {
        let ok = MapTool::parse(REVERSE_GEOCODE, &json!({"lat": 50.06, "lng": 19.94})).unwrap();
        assert!(matches!(ok, MapTool::ReverseGeocode(_)));

        let err = MapTool::parse(REVERSE_GEOCODE, &json!({"lat": 95.0, "lng": 19.94})).unwrap_err();
        assert!(err.to_string().contains("lat"));
    }

    #[test]
    fn search_places_accepts_location_alias() {
        let tool = MapTool::parse(
            SEARCH_PLACES,
            &json!({"query": "museums", "location": "Krakow"}),
        )
        .unwrap();
        match tool {
            MapTool::SearchPlaces(params) => {
                assert_eq!(params.near.as_deref(), Some("Krakow"));
                assert_eq!(params.radius_meters(DEFAULT_RADIUS_METERS, 50_000), DEFAULT_RADIUS_METERS);
            }
            other => panic!("unexpected tool {:?}", other),
        }
    }

    #[test]
    fn search_places_blank_near_is_none() {
        let tool = MapTool::parse(SEARCH_PLACES, &json!({"query": "parks", "near": " "})).unwrap();
        assert!(matches!(tool, MapTool::SearchPlaces(SearchPlacesParams { near: None, .. })));
    }

    #[test]
    fn search_places_radius_is_capped() {
        let params = SearchPlacesParams {
            query: "bars".to_string(),
            near: None,
            radius: Some(80_000.0),
        };
        assert_eq!(params.radius_meters(DEFAULT_RADIUS_METERS, 50_000), 50_000);
    }

    #[test]
    fn search_places_rejects_negative_radius() {
        let err =
            MapTool::parse(SEARCH_PLACES, &json!({"query": "bars", "radius": -5})).unwrap_err();
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn directions_default_to_driving() {
        let tool = MapTool::parse(
            GET_DIRECTIONS,
            &json!({"origin": "Krakow", "destination": "Wieliczka"}),
        )
        .unwrap();
        assert!(matches!(
            tool,
            MapTool::GetDirections(GetDirectionsParams { mode: TravelMode::Driving, .. })
        ));
    }

    #[test]
    fn directions_reject_unknown_mode() {
        let err = MapTool::parse(
            GET_DIRECTIONS,
            &json!({"origin": "A", "destination": "B", "mode": "hovercraft"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("mode"));
    }

    #[test]
    fn accepts_json_encoded_string_arguments() {
        let tool = MapTool::parse(GET_PLACE_DETAILS, &json!("{\"place_id\": \"abc\"}")).unwrap();
        assert!(matches!(tool, MapTool::GetPlaceDetails(_)));
    }

    #[test]
    fn rejects_malformed_string_arguments() {
        let err = MapTool::parse(GEOCODE, &json!("{\"address\": ")).unwrap_err();
        assert!(err.to_string().contains("not a valid JSON object"));
    }

    #[test]
    fn unknown_name_is_unknown_tool() {
        let err = MapTool::parse("teleport", &json!({})).unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("teleport".to_string()));
    }

    #[test]
    fn declarations_cover_every_variant() {
        let names: Vec<String> = MapTool::declarations()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![GEOCODE, REVERSE_GEOCODE, SEARCH_PLACES, GET_DIRECTIONS, GET_PLACE_DETAILS]
        );
    }
}
