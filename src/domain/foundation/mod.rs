//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, validation errors and the lifecycle trait that form
//! the vocabulary of the AI Maps domain.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{InvocationId, QueryId};
pub use state_machine::StateMachine;
