//! Per-query conversation state.
//!
//! One [`ConversationState`] lives for exactly one orchestration loop run.
//! It is owned by that run, never shared and never persisted.

use crate::domain::foundation::QueryId;
use crate::domain::mapping::LocationSummary;
use crate::domain::tools::{ToolInvocationRequest, ToolResult};

use super::{Message, MessageRole};

/// One entry of the conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// The user's query.
    User(String),
    /// An engine reply, with any tool calls it requested.
    Engine {
        text: Option<String>,
        calls: Vec<ToolInvocationRequest>,
    },
    /// The result of one tool call.
    ToolResult(ToolResult),
}

/// Ordered transcript plus round counter for one query.
#[derive(Debug, Clone)]
pub struct ConversationState {
    query_id: QueryId,
    system_prompt: String,
    turns: Vec<Turn>,
    rounds: u32,
}

impl ConversationState {
    /// Seeds a conversation with the system prompt and user query.
    pub fn new(query_id: QueryId, system_prompt: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            query_id,
            system_prompt: system_prompt.into(),
            turns: vec![Turn::User(query.into())],
            rounds: 0,
        }
    }

    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    /// Number of engine rounds started so far.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Starts a new engine round and returns its 1-based number.
    pub fn begin_round(&mut self) -> u32 {
        self.rounds += 1;
        self.rounds
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Records an engine reply.
    pub fn record_engine_turn(&mut self, text: Option<String>, calls: Vec<ToolInvocationRequest>) {
        self.turns.push(Turn::Engine { text, calls });
    }

    /// Records tool results in the order given.
    pub fn record_tool_results(&mut self, results: impl IntoIterator<Item = ToolResult>) {
        self.turns.extend(results.into_iter().map(Turn::ToolResult));
    }

    /// Total number of tool calls requested by the engine.
    pub fn tool_call_count(&self) -> usize {
        self.turns
            .iter()
            .map(|turn| match turn {
                Turn::Engine { calls, .. } => calls.len(),
                _ => 0,
            })
            .sum()
    }

    /// Locations surfaced by successful tool results, first mention wins.
    pub fn locations(&self) -> Vec<LocationSummary> {
        let mut seen = std::collections::HashSet::new();
        let mut locations = Vec::new();
        for turn in &self.turns {
            if let Turn::ToolResult(result) = turn {
                for location in result.locations() {
                    let key = location
                        .place_id
                        .clone()
                        .unwrap_or_else(|| location.name.clone());
                    if seen.insert(key) {
                        locations.push(location.clone());
                    }
                }
            }
        }
        locations
    }

    /// Renders the transcript as engine messages.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        for turn in &self.turns {
            let message = match turn {
                Turn::User(text) => Message::user(text.clone()),
                Turn::Engine { text, calls } => {
                    Message::assistant_with_calls(text.clone().unwrap_or_default(), calls.clone())
                }
                Turn::ToolResult(result) => Message::tool(
                    result.invocation_id().clone(),
                    result.to_payload().to_string(),
                ),
            };
            messages.push(message);
        }
        messages
    }

    /// Returns the latest message role, if any.
    pub fn last_role(&self) -> Option<MessageRole> {
        self.turns.last().map(|turn| match turn {
            Turn::User(_) => MessageRole::User,
            Turn::Engine { .. } => MessageRole::Assistant,
            Turn::ToolResult(_) => MessageRole::Tool,
        })
    }
}
