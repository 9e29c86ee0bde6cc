//! Mapping domain - geographic values and the normalized tool payload.
//!
//! ## Key Types
//!
//! - [`MappingResult`] - Normalized `{summary, detail}` result of any mapping operation
//! - [`MappingError`] - Per-invocation failure taxonomy
//! - [`Coordinates`], [`Place`], [`PlaceDetails`], [`Route`] - Backend values

mod errors;
mod mapping_result;
mod values;

pub use errors::{ErrorKind, MappingError};
pub use mapping_result::{LocationSummary, MappingResult};
pub use values::{
    Coordinates, GeocodedLocation, Place, PlaceDetails, Review, Route, RouteStep, TravelMode,
};
