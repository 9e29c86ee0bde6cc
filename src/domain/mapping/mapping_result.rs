//! Normalized mapping result.
//!
//! Whatever operation ran, the reasoning engine sees the same envelope: a
//! human-readable `summary` it can quote, and a structured `detail` object it
//! can reason over. Location summaries ride alongside for the HTTP answer.

use serde::{Deserialize, Serialize};

use super::values::{Coordinates, GeocodedLocation, Place, PlaceDetails, Route};

/// Upper bound on places listed in a summary line.
const SUMMARY_PLACE_LIMIT: usize = 10;

/// A compact description of a location mentioned by a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl From<&Place> for LocationSummary {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            address: place.address.clone(),
            location: place.location,
            rating: place.rating,
            place_id: place.place_id.clone(),
        }
    }
}

impl From<&GeocodedLocation> for LocationSummary {
    fn from(hit: &GeocodedLocation) -> Self {
        Self {
            name: hit.formatted_address.clone(),
            address: Some(hit.formatted_address.clone()),
            location: Some(hit.location),
            rating: None,
            place_id: hit.place_id.clone(),
        }
    }
}

/// Normalized outcome of a successful mapping operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    tool: String,
    summary: String,
    detail: serde_json::Value,
    #[serde(skip)]
    locations: Vec<LocationSummary>,
}

impl MappingResult {
    /// Creates a result from raw parts.
    ///
    /// A non-object `detail` is wrapped as `{"value": detail}` so the detail
    /// field is always an object.
    pub fn new(
        tool: impl Into<String>,
        summary: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        let detail = match detail {
            serde_json::Value::Object(_) => detail,
            other => serde_json::json!({ "value": other }),
        };
        Self {
            tool: tool.into(),
            summary: summary.into(),
            detail,
            locations: Vec::new(),
        }
    }

    /// Attaches location summaries.
    pub fn with_locations(mut self, locations: Vec<LocationSummary>) -> Self {
        self.locations = locations;
        self
    }

    /// Normalizes forward geocoding hits. The first hit is the best match.
    pub fn geocoded(tool: &str, query: &str, hits: &[GeocodedLocation]) -> Self {
        let summary = match hits.first() {
            Some(best) => format!(
                "'{}' resolves to {} at ({})",
                query, best.formatted_address, best.location
            ),
            None => format!("'{}' could not be resolved", query),
        };
        let detail = serde_json::json!({
            "query": query,
            "best_match": hits.first(),
            "candidates": hits,
        });
        Self::new(tool, summary, detail)
            .with_locations(hits.iter().take(1).map(LocationSummary::from).collect())
    }

    /// Normalizes reverse geocoding hits.
    pub fn reverse_geocoded(tool: &str, point: Coordinates, hits: &[GeocodedLocation]) -> Self {
        let summary = match hits.first() {
            Some(best) => format!("({}) is at {}", point, best.formatted_address),
            None => format!("({}) has no known address", point),
        };
        let detail = serde_json::json!({
            "point": point,
            "address": hits.first().map(|h| h.formatted_address.as_str()),
            "candidates": hits,
        });
        Self::new(tool, summary, detail)
            .with_locations(hits.iter().take(1).map(LocationSummary::from).collect())
    }

    /// Normalizes a places search.
    pub fn places(tool: &str, query: &str, near: Option<&str>, places: &[Place]) -> Self {
        let scope = near.map(|n| format!(" near {}", n)).unwrap_or_default();
        let mut names: Vec<String> = places
            .iter()
            .take(SUMMARY_PLACE_LIMIT)
            .map(|p| match p.rating {
                Some(rating) => format!("{} ({:.1})", p.name, rating),
                None => p.name.clone(),
            })
            .collect();
        if places.len() > SUMMARY_PLACE_LIMIT {
            names.push(format!("and {} more", places.len() - SUMMARY_PLACE_LIMIT));
        }
        let summary = format!(
            "Found {} place{} for '{}'{}: {}",
            places.len(),
            if places.len() == 1 { "" } else { "s" },
            query,
            scope,
            names.join(", ")
        );
        let detail = serde_json::json!({
            "query": query,
            "near": near,
            "count": places.len(),
            "places": places,
        });
        Self::new(tool, summary, detail)
            .with_locations(places.iter().map(LocationSummary::from).collect())
    }

    /// Normalizes place details.
    pub fn place_details(tool: &str, details: &PlaceDetails) -> Self {
        let mut parts = vec![details.place.name.clone()];
        if let Some(address) = &details.place.address {
            parts.push(address.clone());
        }
        if let Some(rating) = details.place.rating {
            parts.push(format!("rated {:.1}", rating));
        }
        if let Some(phone) = &details.phone {
            parts.push(format!("phone {}", phone));
        }
        if let Some(website) = &details.website {
            parts.push(website.clone());
        }
        let detail = serde_json::json!({ "place": details });
        Self::new(tool, parts.join(", "), detail)
            .with_locations(vec![LocationSummary::from(&details.place)])
    }

    /// Normalizes a route.
    pub fn route(tool: &str, route: &Route) -> Self {
        let via = if route.summary.is_empty() {
            String::new()
        } else {
            format!(" via {}", route.summary)
        };
        let summary = format!(
            "{} from {} to {}{}: {}, about {} ({} steps)",
            capitalize(route.mode.as_str()),
            route.start_address,
            route.end_address,
            via,
            route.distance_text,
            route.duration_text,
            route.steps.len()
        );
        let detail = serde_json::json!({ "route": route });
        Self::new(tool, summary, detail)
    }

    /// Returns the tool that produced this result.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Returns the human-readable summary.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the structured detail object.
    pub fn detail(&self) -> &serde_json::Value {
        &self.detail
    }

    /// Returns the locations this result mentions.
    pub fn locations(&self) -> &[LocationSummary] {
        &self.locations
    }

    /// Renders the `{summary, detail}` payload.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "summary": self.summary,
            "detail": self.detail,
        })
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
