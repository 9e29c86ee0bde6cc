//! Integration tests for the Google Maps backend against a mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ai_maps::adapters::maps::{GoogleMapsBackend, GoogleMapsConfig};
use ai_maps::domain::mapping::{Coordinates, MappingError, TravelMode};
use ai_maps::ports::{DirectionsQuery, MappingBackend, PlaceSearch};

// =============================================================================
// Test Infrastructure
// =============================================================================

const KEY: &str = "test-maps-key";

fn backend(server: &MockServer) -> GoogleMapsBackend {
    let config = GoogleMapsConfig::new(KEY)
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(500));
    GoogleMapsBackend::new(config).unwrap()
}

fn krakow() -> Coordinates {
    Coordinates::new(50.0647, 19.945).unwrap()
}

// =============================================================================
// Geocoding
// =============================================================================

#[tokio::test]
async fn geocode_sends_address_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("address", "Krakow"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Kraków, Poland",
                "geometry": {"location": {"lat": 50.0647, "lng": 19.945}},
                "place_id": "pid_krakow"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = backend(&server).geocode("Krakow").await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].formatted_address, "Kraków, Poland");
    assert_eq!(hits[0].location, krakow());
    assert_eq!(hits[0].place_id.as_deref(), Some("pid_krakow"));
}

#[tokio::test]
async fn zero_results_is_empty_not_error() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&server)
        .await;

    let hits = backend(&server).geocode("Atlantis").await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn reverse_geocode_sends_latlng() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .and(query_param("latlng", "50.0647,19.945"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Rynek Główny 1, Kraków",
                "geometry": {"location": {"lat": 50.0617, "lng": 19.9373}}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = backend(&server).reverse_geocode(krakow()).await.unwrap();
    assert_eq!(hits[0].formatted_address, "Rynek Główny 1, Kraków");
}

#[tokio::test]
async fn request_denied_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    let err = backend(&server).geocode("Krakow").await.unwrap_err();
    assert_eq!(
        err,
        MappingError::backend("REQUEST_DENIED", "The provided API key is invalid.")
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend(&server).geocode("Krakow").await.unwrap_err();
    assert!(matches!(err, MappingError::BackendError { ref status, .. } if status == "503"));
    assert!(err.is_transient());
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "OK", "results": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = backend(&server).geocode("Krakow").await.unwrap_err();
    assert!(matches!(err, MappingError::BackendError { ref status, .. } if status == "timeout"));
}

#[tokio::test]
async fn errors_do_not_leak_the_key() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend(&server).geocode("Krakow").await.unwrap_err();
    assert!(!err.to_string().contains(KEY));
}

// =============================================================================
// Places
// =============================================================================

#[tokio::test]
async fn search_with_center_uses_nearby_search() {
    let server = MockServer::start().await;
    Mock::given(path("/place/nearbysearch/json"))
        .and(query_param("location", "50.0647,19.945"))
        .and(query_param("radius", "5000"))
        .and(query_param("keyword", "museums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                {"place_id": "p1", "name": "National Museum", "vicinity": "Al. 3 Maja 1", "rating": 4.6},
                {"place_id": "p2", "name": "Schindler's Factory", "vicinity": "Lipowa 4", "rating": 4.5}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = PlaceSearch {
        query: "museums".to_string(),
        center: Some(krakow()),
        radius_meters: 5000,
    };
    let places = backend(&server).search_places(&search).await.unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].name, "National Museum");
    assert_eq!(places[1].address.as_deref(), Some("Lipowa 4"));
}

#[tokio::test]
async fn search_without_center_uses_text_search() {
    let server = MockServer::start().await;
    Mock::given(path("/place/textsearch/json"))
        .and(query_param("query", "pierogi in Krakow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"place_id": "p9", "name": "Przystanek Pierogarnia",
                         "formatted_address": "Bonerowska 14, Kraków"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = PlaceSearch {
        query: "pierogi in Krakow".to_string(),
        center: None,
        radius_meters: 5000,
    };
    let places = backend(&server).search_places(&search).await.unwrap();
    assert_eq!(places[0].address.as_deref(), Some("Bonerowska 14, Kraków"));
}

#[tokio::test]
async fn place_details_maps_contact_and_reviews() {
    let server = MockServer::start().await;
    Mock::given(path("/place/details/json"))
        .and(query_param("place_id", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": {
                "place_id": "p1",
                "name": "National Museum",
                "formatted_address": "Al. 3 Maja 1, Kraków",
                "formatted_phone_number": "12 433 55 00",
                "website": "https://mnk.pl",
                "opening_hours": {"open_now": false, "weekday_text": ["Monday: Closed"]},
                "reviews": [{"author_name": "Ola", "rating": 5, "text": "Great"}]
            }
        })))
        .mount(&server)
        .await;

    let details = backend(&server).place_details("p1").await.unwrap().unwrap();
    assert_eq!(details.phone.as_deref(), Some("12 433 55 00"));
    assert_eq!(details.opening_hours, vec!["Monday: Closed"]);
    assert_eq!(details.reviews[0].author, "Ola");
    assert_eq!(details.place.open_now, Some(false));
}

#[tokio::test]
async fn unknown_place_is_none() {
    let server = MockServer::start().await;
    Mock::given(path("/place/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "NOT_FOUND"})))
        .mount(&server)
        .await;

    assert!(backend(&server).place_details("nope").await.unwrap().is_none());
}

// =============================================================================
// Directions
// =============================================================================

#[tokio::test]
async fn directions_strip_html_and_keep_mode() {
    let server = MockServer::start().await;
    Mock::given(path("/directions/json"))
        .and(query_param("origin", "Wawel"))
        .and(query_param("destination", "Kazimierz"))
        .and(query_param("mode", "walking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "routes": [{
                "summary": "Stradomska",
                "overview_polyline": {"points": "abc"},
                "legs": [{
                    "distance": {"text": "1.2 km", "value": 1200},
                    "duration": {"text": "15 mins", "value": 900},
                    "start_address": "Wawel, Kraków",
                    "end_address": "Kazimierz, Kraków",
                    "steps": [{
                        "html_instructions": "Head <b>south</b>",
                        "distance": {"text": "0.2 km", "value": 200},
                        "duration": {"text": "3 mins", "value": 180},
                        "travel_mode": "WALKING"
                    }]
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = DirectionsQuery {
        origin: "Wawel".to_string(),
        destination: "Kazimierz".to_string(),
        mode: TravelMode::Walking,
    };
    let routes = backend(&server).directions(&query).await.unwrap();

    assert_eq!(routes.len(), 1);
    let route = &routes[0];
    assert_eq!(route.mode, TravelMode::Walking);
    assert_eq!(route.distance_meters, 1200);
    assert_eq!(route.duration_text, "15 mins");
    assert_eq!(route.steps[0].instruction, "Head south");
    assert_eq!(route.polyline.as_deref(), Some("abc"));
}

#[tokio::test]
async fn invalid_request_is_invalid_arguments() {
    let server = MockServer::start().await;
    Mock::given(path("/directions/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "INVALID_REQUEST",
            "error_message": "Invalid request. Missing the 'origin' parameter."
        })))
        .mount(&server)
        .await;

    let query = DirectionsQuery {
        origin: "?".to_string(),
        destination: "Kazimierz".to_string(),
        mode: TravelMode::Driving,
    };
    let err = backend(&server).directions(&query).await.unwrap_err();
    assert!(matches!(err, MappingError::InvalidArguments(_)));
}
