//! Adapters - implementations of the ports plus the inbound surfaces.
//!
//! - `ai` - reasoning engines (OpenAI-compatible, scripted mock)
//! - `maps` - mapping backends (Google Maps, in-memory)
//! - `protocol` - JSON-RPC tool protocol server
//! - `http` - axum router for queries, protocol and health

pub mod ai;
pub mod http;
pub mod maps;
pub mod protocol;
