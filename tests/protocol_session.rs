//! End-to-end tests for the tool protocol over a newline-delimited stream.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ai_maps::adapters::maps::InMemoryMappingBackend;
use ai_maps::adapters::protocol::{serve, ProtocolError, ProtocolSession};
use ai_maps::application::{MappingAdapter, MappingAdapterConfig};
use ai_maps::domain::mapping::{Coordinates, GeocodedLocation, MappingError, Route, TravelMode};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Client {
    writer: DuplexStream,
    lines: Lines<BufReader<DuplexStream>>,
    server: JoinHandle<Result<(), ProtocolError>>,
}

impl Client {
    async fn send(&mut self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    async fn request(&mut self, message: Value) -> Value {
        self.send(message).await;
        let line = self.lines.next_line().await.unwrap().expect("response line");
        serde_json::from_str(&line).unwrap()
    }

    async fn initialize(&mut self) {
        let response = self
            .request(json!({
                "jsonrpc": "2.0", "id": 0, "method": "initialize",
                "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "inspector", "version": "1.0"}}
            }))
            .await;
        assert!(response["error"].is_null());
        self.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
    }
}

fn backend() -> InMemoryMappingBackend {
    InMemoryMappingBackend::new()
        .with_geocode(
            "Krakow",
            vec![GeocodedLocation {
                formatted_address: "Kraków, Poland".to_string(),
                location: Coordinates::new(50.0647, 19.945).unwrap(),
                place_id: Some("pid_krakow".to_string()),
            }],
        )
        .with_route(
            "Wawel",
            "Kazimierz",
            Route {
                mode: TravelMode::Walking,
                summary: "Stradomska".to_string(),
                start_address: "Wawel, Kraków".to_string(),
                end_address: "Kazimierz, Kraków".to_string(),
                distance_meters: 1200,
                distance_text: "1.2 km".to_string(),
                duration_seconds: 900,
                duration_text: "15 mins".to_string(),
                polyline: None,
                steps: vec![],
            },
        )
}

fn connect(backend: InMemoryMappingBackend, cancel: CancellationToken) -> Client {
    let adapter = Arc::new(MappingAdapter::new(
        Arc::new(backend),
        MappingAdapterConfig::default(),
    ));
    let (client_out, server_in) = tokio::io::duplex(64 * 1024);
    let (server_out, client_in) = tokio::io::duplex(64 * 1024);

    let server = tokio::spawn(serve(
        BufReader::new(server_in),
        server_out,
        ProtocolSession::new(adapter),
        cancel,
    ));

    Client {
        writer: client_out,
        lines: BufReader::new(client_in).lines(),
        server,
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn tools_are_rejected_until_initialized() {
    let mut client = connect(backend(), CancellationToken::new());

    let early = client
        .request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    assert_eq!(early["error"]["code"], -32002);

    client.initialize().await;
    let listed = client
        .request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .await;
    assert_eq!(listed["result"]["tools"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn closing_input_ends_the_session() {
    let mut client = connect(backend(), CancellationToken::new());
    client.initialize().await;

    let Client { writer, server, .. } = client;
    drop(writer);

    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn cancellation_stops_the_server() {
    let cancel = CancellationToken::new();
    let mut client = connect(backend(), cancel.clone());
    client.initialize().await;

    cancel.cancel();
    client.server.await.unwrap().unwrap();
}

// =============================================================================
// Tool calls
// =============================================================================

#[tokio::test]
async fn geocode_twice_yields_identical_results() {
    let mut client = connect(backend(), CancellationToken::new());
    client.initialize().await;

    let call = |id: i64| {
        json!({
            "jsonrpc": "2.0", "id": id, "method": "tools/call",
            "params": {"name": "geocode", "arguments": {"address": "Krakow"}}
        })
    };
    let first = client.request(call(1)).await;
    let second = client.request(call(2)).await;

    assert_eq!(first["result"], second["result"]);
    assert_eq!(
        first["result"]["structuredContent"]["result"]["detail"]["best_match"]["place_id"],
        "pid_krakow"
    );
}

#[tokio::test]
async fn directions_call_returns_route_summary() {
    let mut client = connect(backend(), CancellationToken::new());
    client.initialize().await;

    let response = client
        .request(json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "get_directions",
                       "arguments": {"origin": "Wawel", "destination": "Kazimierz", "mode": "walking"}}
        }))
        .await;

    let result = &response["result"];
    assert_eq!(result["isError"], false);
    assert!(result["content"][0]["text"].as_str().unwrap().contains("15 mins"));
}

#[tokio::test]
async fn empty_result_is_not_an_error() {
    let mut client = connect(backend(), CancellationToken::new());
    client.initialize().await;

    let response = client
        .request(json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "geocode", "arguments": {"address": "Atlantis"}}
        }))
        .await;

    let result = &response["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(result["structuredContent"]["error_kind"], "no_results_found");
}

#[tokio::test]
async fn backend_failure_is_a_tool_error_not_a_protocol_error() {
    let failing = backend().with_failure(MappingError::backend("REQUEST_DENIED", "key rejected"));
    let mut client = connect(failing, CancellationToken::new());
    client.initialize().await;

    let response = client
        .request(json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "geocode", "arguments": {"address": "Krakow"}}
        }))
        .await;

    assert!(response["error"].is_null());
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(response["result"]["structuredContent"]["error_kind"], "backend_error");
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let mut client = connect(backend(), CancellationToken::new());
    client.initialize().await;

    let response = client
        .request(json!({
            "jsonrpc": "2.0", "id": 6, "method": "tools/call",
            "params": {"name": "teleport", "arguments": {}}
        }))
        .await;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["data"]["error_kind"], "unknown_tool");
}
