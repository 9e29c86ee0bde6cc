//! Protocol session - lifecycle and method dispatch for one connection.
//!
//! A session starts `Idle`, becomes `Connected` when a transport attaches,
//! `Serving` after a successful `initialize`, and ends `Disconnected`.
//! Nothing carries over between sessions.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::application::MappingAdapter;
use crate::domain::foundation::StateMachine;
use crate::domain::mapping::{ErrorKind, MappingError, MappingResult};

use super::json_rpc::{
    validate_request, JsonRpcId, JsonRpcRequest, JsonRpcResponse, ProtocolError,
};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "ai-maps";

/// Lifecycle of a protocol session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connected,
    Serving,
    Disconnected,
}

impl StateMachine for SessionState {
    fn valid_transitions(&self) -> Vec<Self> {
        use SessionState::*;
        match self {
            Idle => vec![Connected, Disconnected],
            Connected => vec![Serving, Disconnected],
            Serving => vec![Disconnected],
            Disconnected => vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// One protocol connection over the mapping tools.
pub struct ProtocolSession {
    state: SessionState,
    adapter: Arc<MappingAdapter>,
    client_info: Option<Value>,
    one_shot: bool,
}

impl ProtocolSession {
    pub fn new(adapter: Arc<MappingAdapter>) -> Self {
        Self {
            state: SessionState::Idle,
            adapter,
            client_info: None,
            one_shot: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Name and version the client sent with `initialize`.
    pub fn client_info(&self) -> Option<&Value> {
        self.client_info.as_ref()
    }

    /// Marks the transport as attached.
    pub fn attach(&mut self) -> Result<(), ProtocolError> {
        self.transition(SessionState::Connected)?;
        info!("Protocol session connected");
        Ok(())
    }

    /// Attaches and starts serving immediately. Used by one-shot transports,
    /// where every request arrives on a fresh session and `initialize` is
    /// answered without changing state.
    pub fn attach_serving(&mut self) -> Result<(), ProtocolError> {
        self.transition(SessionState::Connected)?;
        self.transition(SessionState::Serving)?;
        self.one_shot = true;
        Ok(())
    }

    /// Ends the session. Idempotent.
    pub fn disconnect(&mut self) {
        if self.state != SessionState::Disconnected {
            self.state = SessionState::Disconnected;
            info!("Protocol session disconnected");
        }
    }

    fn transition(&mut self, target: SessionState) -> Result<(), ProtocolError> {
        self.state = self
            .state
            .transition_to(target)
            .map_err(|e| ProtocolError::InvalidRequest(e.to_string()))?;
        Ok(())
    }

    /// Parses and handles one raw message. Returns the serialized response,
    /// or `None` for notifications.
    pub async fn handle_message(&mut self, raw: &str) -> Option<String> {
        let response = match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                JsonRpcId::Null,
                ProtocolError::Parse(e.to_string()).to_error(),
            )),
        };
        response.and_then(|r| match serde_json::to_string(&r) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize protocol response");
                None
            }
        })
    }

    /// Handles one request. Returns `None` for notifications.
    pub async fn handle(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, state = ?self.state, "Protocol request");
        let outcome = self.dispatch(&request).await;

        let id = request.id?;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::error(id, err.to_error()),
        })
    }

    async fn dispatch(&mut self, request: &JsonRpcRequest) -> Result<Value, ProtocolError> {
        validate_request(request)?;

        match self.state {
            SessionState::Idle | SessionState::Disconnected => {
                return Err(ProtocolError::SessionClosed)
            }
            SessionState::Connected => {
                if !matches!(
                    request.method.as_str(),
                    "initialize" | "ping" | "notifications/initialized"
                ) {
                    return Err(ProtocolError::NotInitialized);
                }
            }
            SessionState::Serving => {}
        }

        match request.method.as_str() {
            "initialize" => self.initialize(request.params.as_ref()),
            "notifications/initialized" => Ok(Value::Null),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({
                "tools": self.adapter.registry().to_protocol_tools(),
            })),
            "tools/call" => self.call_tool(request.params.clone()).await,
            other => Err(ProtocolError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&mut self, params: Option<&Value>) -> Result<Value, ProtocolError> {
        if self.state == SessionState::Serving && !self.one_shot {
            return Err(ProtocolError::InvalidRequest(
                "session already initialized".to_string(),
            ));
        }
        self.client_info = params.and_then(|p| p.get("clientInfo")).cloned();
        if self.state != SessionState::Serving {
            self.transition(SessionState::Serving)?;
        }
        info!(client = ?self.client_info, "Protocol session initialized");

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
        }))
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, ProtocolError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| ProtocolError::invalid_params(e.to_string()))?;

        if !self.adapter.registry().has_tool(&params.name) {
            let err = MappingError::UnknownTool(params.name.clone());
            return Err(ProtocolError::InvalidParams {
                message: err.to_string(),
                data: Some(json!({
                    "error_kind": err.kind(),
                    "message": err.to_string(),
                })),
            });
        }

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let result = self.adapter.invoke(&params.name, &arguments).await;
        Ok(render_call_result(result))
    }
}

impl Drop for ProtocolSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Renders a tool outcome as a `tools/call` result.
fn render_call_result(result: Result<MappingResult, MappingError>) -> Value {
    match result {
        Ok(mapped) => json!({
            "content": [{ "type": "text", "text": mapped.summary() }],
            "structuredContent": { "result": mapped },
            "isError": false,
        }),
        Err(MappingError::NoResultsFound(message)) => json!({
            "content": [{ "type": "text", "text": message }],
            "structuredContent": {
                "error_kind": ErrorKind::NoResultsFound,
                "message": message,
            },
            "isError": false,
        }),
        Err(err) => json!({
            "content": [{ "type": "text", "text": err.to_string() }],
            "structuredContent": {
                "error_kind": err.kind(),
                "message": err.to_string(),
            },
            "isError": true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::maps::InMemoryMappingBackend;
    use crate::application::MappingAdapterConfig;
    use crate::domain::mapping::{Coordinates, GeocodedLocation};

    fn session() -> ProtocolSession {
        let backend = InMemoryMappingBackend::new().with_geocode(
            "Krakow",
            vec![GeocodedLocation {
                formatted_address: "Kraków, Poland".to_string(),
                location: Coordinates::new(50.0647, 19.945).unwrap(),
                place_id: None,
            }],
        );
        let adapter = MappingAdapter::new(Arc::new(backend), MappingAdapterConfig::default());
        ProtocolSession::new(Arc::new(adapter))
    }

    async fn serving_session() -> ProtocolSession {
        let mut session = session();
        session.attach().unwrap();
        session
            .handle(JsonRpcRequest::new(0, "initialize", Some(json!({"clientInfo": {"name": "test"}}))))
            .await
            .unwrap();
        session
    }

    #[test]
    fn state_machine_transitions() {
        assert!(SessionState::Idle.can_transition_to(&SessionState::Connected));
        assert!(!SessionState::Idle.can_transition_to(&SessionState::Serving));
        assert!(!SessionState::Disconnected.can_transition_to(&SessionState::Connected));
        assert!(SessionState::Disconnected.is_terminal());
    }

    #[tokio::test]
    async fn requests_before_attach_are_rejected() {
        let mut session = session();
        let response = session.handle(JsonRpcRequest::new(1, "ping", None)).await.unwrap();
        assert_eq!(response.error.unwrap().code, super::super::json_rpc::SESSION_CLOSED);
    }

    #[tokio::test]
    async fn tools_list_requires_initialize() {
        let mut session = session();
        session.attach().unwrap();
        let response = session
            .handle(JsonRpcRequest::new(1, "tools/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, super::super::json_rpc::SERVER_NOT_INITIALIZED);

        let pong = session.handle(JsonRpcRequest::new(2, "ping", None)).await.unwrap();
        assert!(!pong.is_error());
    }

    #[tokio::test]
    async fn initialize_moves_to_serving() {
        let session = serving_session().await;
        assert_eq!(session.state(), SessionState::Serving);
        assert_eq!(session.client_info().unwrap()["name"], "test");
    }

    #[tokio::test]
    async fn second_initialize_is_rejected() {
        let mut session = serving_session().await;
        let response = session
            .handle(JsonRpcRequest::new(5, "initialize", None))
            .await
            .unwrap();
        assert!(response.is_error());
        assert_eq!(session.state(), SessionState::Serving);
    }

    #[tokio::test]
    async fn one_shot_session_answers_initialize_and_tools() {
        let mut session = session();
        session.attach_serving().unwrap();

        let init = session
            .handle(JsonRpcRequest::new(1, "initialize", None))
            .await
            .unwrap();
        assert_eq!(init.result.unwrap()["serverInfo"]["name"], "ai-maps");

        let list = session
            .handle(JsonRpcRequest::new(2, "tools/list", None))
            .await
            .unwrap();
        assert!(!list.is_error());
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let mut session = serving_session().await;
        let response = session
            .handle(JsonRpcRequest::notification("notifications/initialized"))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn tools_list_returns_input_schemas() {
        let mut session = serving_session().await;
        let response = session
            .handle(JsonRpcRequest::new(1, "tools/list", None))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[0]["name"], "geocode");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn tools_call_returns_summary_text() {
        let mut session = serving_session().await;
        let response = session
            .handle(JsonRpcRequest::new(
                1,
                "tools/call",
                Some(json!({"name": "geocode", "arguments": {"address": "Krakow"}})),
            ))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("Kraków"));
        assert_eq!(result["structuredContent"]["result"]["tool"], "geocode");
    }

    #[tokio::test]
    async fn tool_failure_sets_is_error() {
        let mut session = serving_session().await;
        let response = session
            .handle(JsonRpcRequest::new(
                1,
                "tools/call",
                Some(json!({"name": "geocode", "arguments": {}})),
            ))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["error_kind"], "invalid_arguments");
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let mut session = serving_session().await;
        let response = session
            .handle(JsonRpcRequest::new(
                9,
                "tools/call",
                Some(json!({"name": "teleport"})),
            ))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.data.unwrap()["error_kind"], "unknown_tool");
        assert_eq!(response.id, JsonRpcId::Number(9));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let mut session = serving_session().await;
        let response = session
            .handle(JsonRpcRequest::new(1, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn disconnected_session_rejects_everything() {
        let mut session = serving_session().await;
        session.disconnect();
        let response = session.handle(JsonRpcRequest::new(1, "ping", None)).await.unwrap();
        assert!(response.is_error());
        assert!(session.attach().is_err());
    }

    #[tokio::test]
    async fn malformed_message_is_parse_error() {
        let mut session = serving_session().await;
        let raw = session.handle_message("{not json").await.unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["id"], Value::Null);
    }
}
