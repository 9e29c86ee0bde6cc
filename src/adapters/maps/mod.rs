//! Mapping Backend Adapters.
//!
//! - `GoogleMapsBackend` - Google Maps Platform web services
//! - `InMemoryMappingBackend` - Fixed tables for testing

mod google_maps;
mod in_memory;

pub use google_maps::{GoogleMapsBackend, GoogleMapsConfig};
pub use in_memory::InMemoryMappingBackend;
