//! Orchestration Loop - drives the tool-calling exchange for one query.
//!
//! Each round sends the transcript and tool declarations to the reasoning
//! engine. A final answer ends the run. A batch of tool calls is executed
//! concurrently through the [`MappingAdapter`], results are appended in the
//! engine's order, and the next round begins. The number of rounds is
//! bounded; running out is an error, never a truncated answer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::QueryId;
use crate::domain::mapping::{LocationSummary, MappingError};
use crate::domain::tools::{ToolInvocationRequest, ToolResult};
use crate::ports::{EngineError, EngineReply, EngineRequest, ReasoningEngine, RequestMetadata};

use super::MappingAdapter;

/// System prompt seeding every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about \
locations. Use the mapping tools to look up addresses, coordinates, places and routes instead of \
guessing. When a question is not about geography, answer it directly. Include relevant details \
such as names, addresses and ratings, formatted in a user-friendly way.";

/// Loop settings.
#[derive(Debug, Clone)]
pub struct OrchestrationConfig {
    /// Maximum engine rounds per query.
    pub max_rounds: u32,
    /// Extra attempts for a tool call that failed transiently.
    pub backend_retries: u32,
    /// Concurrent sibling tool calls. Zero means unlimited.
    pub max_parallel_tools: usize,
    /// Upper bound on each engine call.
    pub engine_timeout: Duration,
    pub system_prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            backend_retries: 1,
            max_parallel_tools: 4,
            engine_timeout: Duration::from_secs(60),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Errors that end a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    /// The query was empty or whitespace only.
    #[error("query cannot be empty")]
    EmptyQuery,

    /// The engine was unreachable, timed out, or produced malformed output.
    #[error("reasoning engine error: {0}")]
    ReasoningEngine(#[from] EngineError),

    /// No final answer within the round bound.
    #[error("no final answer within {max_rounds} rounds")]
    LoopExceeded { max_rounds: u32 },

    /// The caller went away.
    #[error("query cancelled")]
    Cancelled,
}

/// Final answer plus what it took to get there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub query_id: QueryId,
    pub answer: String,
    pub rounds: u32,
    pub tool_calls: usize,
    pub locations: Vec<LocationSummary>,
}

/// Binds the reasoning engine to the mapping tools.
pub struct OrchestrationLoop {
    engine: Arc<dyn ReasoningEngine>,
    adapter: Arc<MappingAdapter>,
    config: OrchestrationConfig,
}

impl OrchestrationLoop {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        adapter: Arc<MappingAdapter>,
        config: OrchestrationConfig,
    ) -> Self {
        Self {
            engine,
            adapter,
            config,
        }
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Answers a query, returning only the text.
    pub async fn answer(&self, user_query: &str) -> Result<String, OrchestrationError> {
        self.run(user_query, CancellationToken::new())
            .await
            .map(|answer| answer.answer)
    }

    /// Answers a query until done, bounded, or cancelled.
    pub async fn run(
        &self,
        user_query: &str,
        cancel: CancellationToken,
    ) -> Result<QueryAnswer, OrchestrationError> {
        let query = user_query.trim();
        if query.is_empty() {
            return Err(OrchestrationError::EmptyQuery);
        }

        let started = Instant::now();
        let mut state = ConversationState::new(QueryId::new(), &self.config.system_prompt, query);
        let query_id = state.query_id();
        info!(%query_id, engine = %self.engine.engine_info().model, "Query started");

        let result = self.drive(&mut state, &cancel).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(answer) => {
                info!(
                    %query_id,
                    rounds = state.rounds(),
                    tool_calls = state.tool_call_count(),
                    elapsed_ms,
                    "Query answered"
                );
                Ok(QueryAnswer {
                    query_id,
                    answer,
                    rounds: state.rounds(),
                    tool_calls: state.tool_call_count(),
                    locations: state.locations(),
                })
            }
            Err(OrchestrationError::Cancelled) => {
                info!(%query_id, rounds = state.rounds(), elapsed_ms, "Query cancelled");
                Err(OrchestrationError::Cancelled)
            }
            Err(err) => {
                error!(%query_id, rounds = state.rounds(), elapsed_ms, error = %err, "Query failed");
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        state: &mut ConversationState,
        cancel: &CancellationToken,
    ) -> Result<String, OrchestrationError> {
        loop {
            if cancel.is_cancelled() {
                return Err(OrchestrationError::Cancelled);
            }

            let round = state.begin_round();
            let reply = tokio::select! {
                _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
                reply = self.call_engine(state, round) => reply?,
            };

            if reply.has_tool_calls() {
                debug!(
                    query_id = %state.query_id(),
                    round,
                    calls = reply.tool_calls.len(),
                    "Engine requested tools"
                );
                let calls = reply.tool_calls;
                state.record_engine_turn(reply.content, calls.clone());

                let results = tokio::select! {
                    _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
                    results = self.execute_batch(&calls) => results,
                };
                state.record_tool_results(results);

                if round >= self.config.max_rounds {
                    return Err(OrchestrationError::LoopExceeded {
                        max_rounds: self.config.max_rounds,
                    });
                }
                continue;
            }

            return match reply.text() {
                Some(text) => Ok(text.to_string()),
                None => Err(EngineError::malformed("reply carried neither text nor tool calls").into()),
            };
        }
    }

    async fn call_engine(
        &self,
        state: &ConversationState,
        round: u32,
    ) -> Result<EngineReply, EngineError> {
        let mut request = EngineRequest::new(RequestMetadata::new(state.query_id(), round))
            .with_messages(state.to_messages())
            .with_tools(self.adapter.registry().list_tools().to_vec());
        if let Some(max) = self.config.max_tokens {
            request = request.with_max_tokens(max);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        debug!(query_id = %state.query_id(), round, "Calling reasoning engine");
        match tokio::time::timeout(self.config.engine_timeout, self.engine.complete(request)).await {
            Ok(reply) => reply,
            Err(_) => Err(EngineError::timeout(self.config.engine_timeout)),
        }
    }

    /// Runs sibling calls concurrently; results keep request order.
    async fn execute_batch(&self, calls: &[ToolInvocationRequest]) -> Vec<ToolResult> {
        let limiter = (self.config.max_parallel_tools > 0)
            .then(|| Semaphore::new(self.config.max_parallel_tools));

        let futures = calls.iter().map(|call| {
            let limiter = limiter.as_ref();
            async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };
                self.execute_call(call).await
            }
        });

        join_all(futures).await
    }

    async fn execute_call(&self, call: &ToolInvocationRequest) -> ToolResult {
        let mut attempt = 0;
        loop {
            let result = self.adapter.invoke(call.name(), call.arguments()).await;
            match &result {
                Err(err) if err.is_transient() && attempt < self.config.backend_retries => {
                    attempt += 1;
                    warn!(
                        tool = call.name(),
                        invocation_id = %call.id(),
                        attempt,
                        error = %err,
                        "Transient backend failure, retrying"
                    );
                    continue;
                }
                Err(MappingError::NoResultsFound(message)) => {
                    debug!(tool = call.name(), invocation_id = %call.id(), %message, "No results");
                }
                Err(err) => {
                    warn!(tool = call.name(), invocation_id = %call.id(), error = %err, "Tool invocation failed");
                }
                Ok(_) => {
                    debug!(tool = call.name(), invocation_id = %call.id(), "Tool invocation succeeded");
                }
            }
            return ToolResult::from_mapping(call.id().clone(), call.name(), result);
        }
    }
}
