//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `ReasoningEngine` - Tool-calling language model
//! - `MappingBackend` - Geographic data provider

mod mapping_backend;
mod reasoning_engine;

pub use mapping_backend::{DirectionsQuery, MappingBackend, PlaceSearch};
pub use reasoning_engine::{
    EngineError, EngineInfo, EngineReply, EngineRequest, FinishReason, ReasoningEngine,
    RequestMetadata, TokenUsage,
};
