//! Scripted reasoning engine for testing.
//!
//! Provides a configurable implementation of the ReasoningEngine port,
//! allowing the orchestration loop to run without calling a real model.
//!
//! # Features
//!
//! - Scripted replies consumed in order (answers or tool-call batches)
//! - A fallback reply once the script runs out
//! - Simulated delays for timeout and cancellation testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```
//! use ai_maps::adapters::ai::MockReasoningEngine;
//! use serde_json::json;
//!
//! let engine = MockReasoningEngine::new()
//!     .with_tool_call("geocode", json!({"address": "Krakow"}))
//!     .with_answer("Krakow is in southern Poland.");
//! assert_eq!(engine.call_count(), 0);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::tools::ToolInvocationRequest;
use crate::ports::{
    EngineError, EngineInfo, EngineReply, EngineRequest, ReasoningEngine, TokenUsage,
};

/// Scripted reasoning engine.
#[derive(Debug, Clone)]
pub struct MockReasoningEngine {
    /// Scripted replies (consumed in order).
    replies: Arc<Mutex<VecDeque<Result<EngineReply, EngineError>>>>,
    /// Reply used once the script is exhausted.
    fallback: Result<EngineReply, EngineError>,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<EngineRequest>>>,
    /// Counter for generated call ids.
    next_call_id: Arc<Mutex<u32>>,
}

impl Default for MockReasoningEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReasoningEngine {
    /// Creates an engine that answers "Mock response" unless scripted.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Ok(EngineReply::answer("Mock response")),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            next_call_id: Arc::new(Mutex::new(0)),
        }
    }

    /// Queues a final answer.
    pub fn with_answer(self, content: impl Into<String>) -> Self {
        self.with_reply(EngineReply::answer(content))
    }

    /// Queues a reply requesting a single tool call.
    pub fn with_tool_call(self, name: &str, arguments: serde_json::Value) -> Self {
        self.with_tool_calls(vec![(name, arguments)])
    }

    /// Queues a reply requesting several sibling tool calls.
    pub fn with_tool_calls(self, calls: Vec<(&str, serde_json::Value)>) -> Self {
        let requests = calls
            .into_iter()
            .map(|(name, arguments)| ToolInvocationRequest::new(self.generate_id(), name, arguments))
            .collect();
        self.with_reply(EngineReply::tool_calls(requests))
    }

    /// Queues an arbitrary reply.
    pub fn with_reply(self, reply: EngineReply) -> Self {
        self.replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: EngineError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Replies with a tool call forever once the script is exhausted.
    pub fn always_calling(mut self, name: &str, arguments: serde_json::Value) -> Self {
        self.fallback = Ok(EngineReply::tool_calls(vec![ToolInvocationRequest::new(
            "call_repeat",
            name,
            arguments,
        )]));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this engine.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded requests.
    pub fn get_calls(&self) -> Vec<EngineRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn generate_id(&self) -> String {
        let mut next = self.next_call_id.lock().unwrap();
        *next += 1;
        format!("call_{}", *next)
    }

    fn next_reply(&self) -> Result<EngineReply, EngineError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ReasoningEngine for MockReasoningEngine {
    async fn complete(&self, request: EngineRequest) -> Result<EngineReply, EngineError> {
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.next_reply().map(|reply| EngineReply {
            usage: TokenUsage::new(10, 20),
            model: "mock-model-1".to_string(),
            ..reply
        })
    }

    fn engine_info(&self) -> EngineInfo {
        EngineInfo::new("mock", "mock-model-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::QueryId;
    use crate::ports::RequestMetadata;
    use serde_json::json;

    fn request() -> EngineRequest {
        EngineRequest::new(RequestMetadata::new(QueryId::new(), 1))
    }

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let engine = MockReasoningEngine::new()
            .with_tool_call("geocode", json!({"address": "Krakow"}))
            .with_answer("done");

        let first = engine.complete(request()).await.unwrap();
        assert_eq!(first.tool_calls[0].name(), "geocode");
        assert_eq!(first.tool_calls[0].id().as_str(), "call_1");

        let second = engine.complete(request()).await.unwrap();
        assert_eq!(second.text(), Some("done"));

        let third = engine.complete(request()).await.unwrap();
        assert_eq!(third.text(), Some("Mock response"));
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn errors_are_returned() {
        let engine = MockReasoningEngine::new().with_error(EngineError::AuthenticationFailed);
        let err = engine.complete(request()).await.unwrap_err();
        assert_eq!(err, EngineError::AuthenticationFailed);
    }

    #[tokio::test]
    async fn always_calling_never_answers() {
        let engine = MockReasoningEngine::new().always_calling("geocode", json!({"address": "x"}));
        for _ in 0..3 {
            assert!(engine.complete(request()).await.unwrap().has_tool_calls());
        }
    }
}
