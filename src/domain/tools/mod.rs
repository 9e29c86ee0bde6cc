//! Tools - declarations, typed invocations and results.
//!
//! ## Key Types
//!
//! - [`ToolRegistry`] - Ordered set of declared tools, resolves raw requests
//! - [`MapTool`] - Closed set of mapping operations with typed parameters
//! - [`ToolInvocationRequest`] / [`ToolResult`] - One engine-requested call and its outcome

mod errors;
mod map_tool;
mod tool_call;
mod tool_definition;
mod tool_registry;
mod tool_result;

pub use errors::ToolError;
pub use map_tool::{
    GeocodeParams, GetDirectionsParams, MapTool, PlaceDetailsParams, ReverseGeocodeParams,
    SearchPlacesParams, DEFAULT_RADIUS_METERS, GEOCODE, GET_DIRECTIONS, GET_PLACE_DETAILS,
    REVERSE_GEOCODE, SEARCH_PLACES,
};
pub use tool_call::ToolInvocationRequest;
pub use tool_definition::{ParamType, ParameterSpec, ToolDeclaration};
pub use tool_registry::ToolRegistry;
pub use tool_result::{ToolOutcome, ToolResult};
