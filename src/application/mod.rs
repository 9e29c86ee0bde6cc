//! Application layer - the mapping adapter and the orchestration loop.
//!
//! This layer coordinates the domain with the reasoning engine and mapping
//! backend ports. It holds no transport concerns.

mod mapping_adapter;
mod orchestration_loop;

pub use mapping_adapter::{MappingAdapter, MappingAdapterConfig};
pub use orchestration_loop::{
    OrchestrationConfig, OrchestrationError, OrchestrationLoop, QueryAnswer,
    DEFAULT_SYSTEM_PROMPT,
};
