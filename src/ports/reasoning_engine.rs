//! Reasoning Engine Port - Interface for tool-calling language models.
//!
//! This port abstracts the language model that turns a user query into tool
//! invocations and, eventually, a final answer. The orchestration loop talks
//! only to this trait, so it can run against OpenAI-compatible services or a
//! scripted test double.
//!
//! # Design
//!
//! - One call per round: the full transcript plus tool declarations go in,
//!   either a final answer or a batch of tool calls comes out
//! - Provider-agnostic message format ([`Message`])
//! - Error types for common failure modes (rate limits, timeouts, malformed output)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Message, MessageRole};
use crate::domain::foundation::QueryId;
use crate::domain::tools::{ToolDeclaration, ToolInvocationRequest};

/// Port for reasoning engine interactions.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Runs one round: the engine answers or requests tool calls.
    async fn complete(&self, request: EngineRequest) -> Result<EngineReply, EngineError>;

    /// Get engine information (name, model).
    fn engine_info(&self) -> EngineInfo;
}

/// Request for one engine round.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Transcript so far, system prompt first.
    pub messages: Vec<Message>,
    /// Tools the engine may call.
    pub tools: Vec<ToolDeclaration>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness.
    pub temperature: Option<f32>,
    /// Request metadata for tracing.
    pub metadata: RequestMetadata,
}

impl EngineRequest {
    /// Creates a new request with required metadata.
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
            metadata,
        }
    }

    /// Sets the transcript.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Adds a plain message.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    /// Sets the callable tools.
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// Query this round belongs to.
    pub query_id: QueryId,
    /// 1-based round number.
    pub round: u32,
}

impl RequestMetadata {
    pub fn new(query_id: QueryId, round: u32) -> Self {
        Self { query_id, round }
    }
}

/// Reply from one engine round.
#[derive(Debug, Clone, Default)]
pub struct EngineReply {
    /// Generated text, if any.
    pub content: Option<String>,
    /// Tool calls requested, in engine order.
    pub tool_calls: Vec<ToolInvocationRequest>,
    /// Token usage.
    pub usage: TokenUsage,
    /// Model that generated the reply.
    pub model: String,
    /// Why the model stopped generating.
    pub finish_reason: Option<FinishReason>,
}

impl EngineReply {
    /// Creates a final-answer reply.
    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some(FinishReason::Stop),
            ..Self::default()
        }
    }

    /// Creates a reply requesting tool calls.
    pub fn tool_calls(calls: Vec<ToolInvocationRequest>) -> Self {
        Self {
            tool_calls: calls,
            finish_reason: Some(FinishReason::ToolCalls),
            ..Self::default()
        }
    }

    /// Returns true if the engine requested tools.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Returns the non-blank text content.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// The model requested tool calls.
    ToolCalls,
    /// Content was filtered for safety.
    ContentFilter,
}

/// Engine information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Engine name (e.g., "openai").
    pub name: String,
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,
}

impl EngineInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Reasoning engine errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered {
        /// Reason for filtering.
        reason: String,
    },

    /// Provider is unavailable.
    #[error("engine unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Reply could not be parsed or carried neither text nor tool calls.
    #[error("malformed engine output: {0}")]
    Malformed(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },
}

impl EngineError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a content filtered error.
    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a malformed output error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_secs: after.as_secs(),
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::RateLimited { .. }
                | EngineError::Unavailable { .. }
                | EngineError::Network(_)
                | EngineError::Timeout { .. }
        )
    }

    /// Returns true if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> RequestMetadata {
        RequestMetadata::new(QueryId::new(), 1)
    }

    #[test]
    fn engine_request_builder_works() {
        let request = EngineRequest::new(metadata())
            .with_message(MessageRole::System, "Be helpful")
            .with_message(MessageRole::User, "Where is Wawel?")
            .with_max_tokens(100)
            .with_temperature(0.2);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.tools.is_empty());
    }

    #[test]
    fn reply_text_ignores_blank_content() {
        let reply = EngineReply {
            content: Some("   ".to_string()),
            ..EngineReply::default()
        };
        assert_eq!(reply.text(), None);
        assert_eq!(EngineReply::answer(" Hi ").text(), Some("Hi"));
    }

    #[test]
    fn tool_call_reply_reports_calls() {
        let reply = EngineReply::tool_calls(vec![ToolInvocationRequest::new(
            "call_1",
            "geocode",
            json!({"address": "Krakow"}),
        )]);
        assert!(reply.has_tool_calls());
        assert_eq!(reply.finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn token_usage_calculates_total() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn engine_error_retryable_classification() {
        assert!(EngineError::rate_limited(30).is_retryable());
        assert!(EngineError::unavailable("down").is_retryable());
        assert!(EngineError::network("reset").is_retryable());
        assert!(EngineError::Timeout { timeout_secs: 30 }.is_retryable());

        assert!(!EngineError::AuthenticationFailed.is_retryable());
        assert!(!EngineError::malformed("no choices").is_retryable());
        assert!(!EngineError::content_filtered("bad").is_retryable());
    }

    #[test]
    fn engine_error_displays_correctly() {
        assert_eq!(
            EngineError::rate_limited(30).to_string(),
            "rate limited: retry after 30s"
        );
        assert_eq!(
            EngineError::timeout(std::time::Duration::from_secs(45)).to_string(),
            "request timed out after 45s"
        );
    }

    #[test]
    fn finish_reason_serializes_snake_case() {
        let json = serde_json::to_string(&FinishReason::ToolCalls).unwrap();
        assert_eq!(json, "\"tool_calls\"");
    }
}
