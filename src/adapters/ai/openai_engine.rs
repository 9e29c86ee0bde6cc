//! OpenAI Engine - Implementation of ReasoningEngine for OpenAI-compatible APIs.
//!
//! Sends the transcript plus function declarations to `/chat/completions`
//! with `tool_choice: "auto"` and maps the reply into either a final answer
//! or a batch of tool invocations.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let engine = OpenAIEngine::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::conversation::{Message, MessageRole};
use crate::domain::tools::ToolInvocationRequest;
use crate::ports::{
    EngineError, EngineInfo, EngineReply, EngineRequest, FinishReason, ReasoningEngine,
    TokenUsage,
};

/// Configuration for the OpenAI engine.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry.
    pub retry_backoff: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff: Duration::from_secs(1),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
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

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible reasoning engine.
pub struct OpenAIEngine {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &EngineRequest) -> OpenAIRequest {
        let tools: Vec<serde_json::Value> = request
            .tools
            .iter()
            .map(|tool| tool.to_openai_format())
            .collect();
        let tool_choice = (!tools.is_empty()).then(|| "auto".to_string());

        OpenAIRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            tools,
            tool_choice,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Sends a request.
    async fn send_request(&self, request: &OpenAIRequest) -> Result<Response, EngineError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::timeout(self.config.timeout)
                } else if e.is_connect() {
                    EngineError::network(format!("Connection failed: {}", e))
                } else {
                    EngineError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, EngineError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(EngineError::AuthenticationFailed),
            429 => Err(EngineError::rate_limited(Self::parse_retry_after(&error_body))),
            400 => Err(EngineError::InvalidRequest(error_body)),
            500..=599 => Err(EngineError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(EngineError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(s) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                if let Some(idx) = s.find("try again in ") {
                    let rest = &s[idx + 13..];
                    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                    if let Ok(secs) = digits.parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
        30
    }

    /// Parses a completion response.
    async fn parse_response(&self, response: Response) -> Result<EngineReply, EngineError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| EngineError::malformed(format!("Failed to parse response: {}", e)))?;

        Self::into_reply(openai_response)
    }

    fn into_reply(openai_response: OpenAIResponse) -> Result<EngineReply, EngineError> {
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::malformed("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") => Some(FinishReason::Stop),
            Some("length") => Some(FinishReason::Length),
            Some("tool_calls") | Some("function_call") => Some(FinishReason::ToolCalls),
            Some("content_filter") => Some(FinishReason::ContentFilter),
            _ => None,
        };

        if finish_reason == Some(FinishReason::ContentFilter) {
            return Err(EngineError::content_filtered("completion was filtered"));
        }

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                ToolInvocationRequest::from_raw_arguments(
                    call.id,
                    call.function.name,
                    &call.function.arguments,
                )
            })
            .collect();

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(EngineReply {
            content: choice.message.content,
            tool_calls,
            usage,
            model: openai_response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl ReasoningEngine for OpenAIEngine {
    async fn complete(&self, request: EngineRequest) -> Result<EngineReply, EngineError> {
        let openai_request = self.to_openai_request(&request);
        let mut retry_count = 0;

        loop {
            let attempt = match self.send_request(&openai_request).await {
                Ok(response) => self.parse_response(response).await,
                Err(err) => Err(err),
            };

            match attempt {
                Ok(reply) => {
                    debug!(
                        query_id = %request.metadata.query_id,
                        round = request.metadata.round,
                        tool_calls = reply.tool_calls.len(),
                        total_tokens = reply.usage.total_tokens,
                        "OpenAI completion received"
                    );
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    let delay = backoff_delay(self.config.retry_backoff, retry_count);
                    warn!(error = %err, retry = retry_count + 1, delay_ms = delay.as_millis() as u64, "Retrying OpenAI request");
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn engine_info(&self) -> EngineInfo {
        EngineInfo::new("openai", &self.config.model)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for OpenAIMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };
        let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
            msg.tool_calls
                .iter()
                .map(|call| OpenAIToolCall {
                    id: call.id().to_string(),
                    kind: "function".to_string(),
                    function: OpenAIFunctionCall {
                        name: call.name().to_string(),
                        arguments: call.arguments_text(),
                    },
                })
                .collect()
        });
        // Assistant turns that only call tools carry a null content.
        let content = if msg.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(msg.content.clone())
        };

        Self {
            role: role.to_string(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.as_ref().map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "default_call_kind")]
    kind: String,
    function: OpenAIFunctionCall,
}

fn default_call_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Exponential backoff: base, 2x base, 4x base, ... saturating on overflow.
fn backoff_delay(base: Duration, retry_count: u32) -> Duration {
    let factor = 1u32.checked_shl(retry_count).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{InvocationId, QueryId};
    use crate::domain::tools::ToolRegistry;
    use crate::ports::RequestMetadata;
    use serde_json::json;

    #[test]
    fn backoff_doubles_per_retry() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
    }

    #[test]
    fn backoff_saturates_for_large_retry_counts() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 31), base * (1u32 << 31));
        assert_eq!(backoff_delay(base, 32), base * u32::MAX);
        assert_eq!(backoff_delay(Duration::MAX, 40), Duration::MAX);
    }

    fn engine() -> OpenAIEngine {
        OpenAIEngine::new(OpenAIConfig::new("test-key")).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_debug_hides_key() {
        let rendered = format!("{:?}", OpenAIConfig::new("sk-very-secret"));
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[test]
    fn request_declares_tools_with_auto_choice() {
        let request = EngineRequest::new(RequestMetadata::new(QueryId::new(), 1))
            .with_message(MessageRole::User, "Top museums in Krakow")
            .with_tools(ToolRegistry::mapping_tools().list_tools().to_vec());
        let body = serde_json::to_value(engine().to_openai_request(&request)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"].as_array().unwrap().len(), 5);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn request_without_tools_omits_tool_choice() {
        let request = EngineRequest::new(RequestMetadata::new(QueryId::new(), 1))
            .with_message(MessageRole::User, "Hi");
        let body = serde_json::to_value(engine().to_openai_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn tool_turns_serialize_in_openai_shape() {
        let call = ToolInvocationRequest::new("call_1", "geocode", json!({"address": "Krakow"}));
        let assistant = OpenAIMessage::from(&Message::assistant_with_calls("", vec![call]));
        let tool = OpenAIMessage::from(&Message::tool(InvocationId::new("call_1"), "{\"status\":\"success\"}"));

        let assistant = serde_json::to_value(assistant).unwrap();
        assert_eq!(assistant["content"], serde_json::Value::Null);
        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert_eq!(
            assistant["tool_calls"][0]["function"]["arguments"],
            "{\"address\":\"Krakow\"}"
        );

        let tool = serde_json::to_value(tool).unwrap();
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_1");
    }

    #[test]
    fn reply_with_tool_calls_is_parsed() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "search_places", "arguments": "{\"query\":\"museums\",\"near\":\"Krakow\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 50, "completion_tokens": 10}
        }))
        .unwrap();

        let reply = OpenAIEngine::into_reply(response).unwrap();
        assert_eq!(reply.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(reply.tool_calls[0].id().as_str(), "call_abc");
        assert_eq!(reply.tool_calls[0].arguments()["near"], "Krakow");
        assert_eq!(reply.usage.total_tokens, 60);
    }

    #[test]
    fn malformed_arguments_are_kept_raw() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{"id": "c", "type": "function", "function": {"name": "geocode", "arguments": "{oops"}}]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();
        let reply = OpenAIEngine::into_reply(response).unwrap();
        assert_eq!(reply.tool_calls[0].arguments(), &json!("{oops"));
    }

    #[test]
    fn empty_choices_is_malformed() {
        let response: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let err = OpenAIEngine::into_reply(response).unwrap_err();
        assert!(matches!(err, EngineError::Malformed(_)));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12 seconds."}}"#;
        assert_eq!(OpenAIEngine::parse_retry_after(error), 12);
    }

    #[test]
    fn parse_retry_after_default() {
        let error = r#"{"error":{"message":"Something went wrong"}}"#;
        assert_eq!(OpenAIEngine::parse_retry_after(error), 30);
    }

    #[test]
    fn engine_info_reports_model() {
        let info = engine().engine_info();
        assert_eq!(info.name, "openai");
        assert_eq!(info.model, "gpt-4o-mini");
    }
}
