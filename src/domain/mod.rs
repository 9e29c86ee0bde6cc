//! Domain layer containing the mapping vocabulary and conversation model.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, validation errors, state machines)
//! - `mapping` - Geographic values and the normalized mapping result
//! - `tools` - Tool declarations, the registry and typed invocations
//! - `conversation` - Per-query transcript fed to the reasoning engine

pub mod conversation;
pub mod foundation;
pub mod mapping;
pub mod tools;
