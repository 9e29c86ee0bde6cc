//! Reasoning Engine Adapters.
//!
//! Implementations of the ReasoningEngine port.
//!
//! ## Available Adapters
//!
//! - `OpenAIEngine` - OpenAI-compatible chat completions with function calling
//! - `MockReasoningEngine` - Scripted engine for testing

mod mock_engine;
mod openai_engine;

pub use mock_engine::MockReasoningEngine;
pub use openai_engine::{OpenAIConfig, OpenAIEngine};
