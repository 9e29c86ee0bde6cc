//! AI Maps - natural-language location queries answered by a reasoning
//! engine that drives mapping tools.
//!
//! The orchestration loop hands a query and the declared mapping tools to
//! an OpenAI-compatible engine, executes the tool calls it requests against
//! Google Maps, and feeds results back until the engine answers. The same
//! tools are served to external clients over a JSON-RPC tool protocol.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
