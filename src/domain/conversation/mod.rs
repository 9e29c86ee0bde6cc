//! Conversation - the transcript driven by the orchestration loop.
//!
//! ## Key Types
//!
//! - [`ConversationState`] - Ordered turns and round counter for one query
//! - [`Message`] - Provider-agnostic engine message

mod conversation_state;
mod message;

pub use conversation_state::{ConversationState, Turn};
pub use message::{Message, MessageRole};
