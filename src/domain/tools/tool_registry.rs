//! Tool Registry - the declared mapping operations.
//!
//! The registry keeps declarations in registration order so listings are
//! stable across calls, and resolves raw invocation requests into typed
//! [`MapTool`] values.
//!
//! # Example
//!
//! ```
//! use ai_maps::domain::tools::ToolRegistry;
//!
//! let registry = ToolRegistry::mapping_tools();
//! assert!(registry.get("geocode").is_ok());
//! assert!(registry.get("teleport").is_err());
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::warn;

use super::{MapTool, ToolDeclaration, ToolError, ToolInvocationRequest};

static MAPPING_TOOLS: Lazy<ToolRegistry> =
    Lazy::new(|| ToolRegistry::from_declarations(MapTool::declarations()));

/// Ordered registry of tool declarations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Declarations in registration order
    declarations: Vec<ToolDeclaration>,

    /// Tool name to position in `declarations`
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, keeping the first of any duplicated names.
    pub fn from_declarations(declarations: impl IntoIterator<Item = ToolDeclaration>) -> Self {
        let mut registry = Self::new();
        for declaration in declarations {
            let name = declaration.name().to_string();
            if let Err(e) = registry.register(declaration) {
                warn!(tool = %name, error = %e, "Skipping tool declaration");
            }
        }
        registry
    }

    /// Returns the process-wide registry of mapping tools.
    pub fn mapping_tools() -> &'static ToolRegistry {
        &MAPPING_TOOLS
    }

    /// Registers a declaration. Names must be unique.
    pub fn register(&mut self, declaration: ToolDeclaration) -> Result<(), ToolError> {
        let name = declaration.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.index.insert(name, self.declarations.len());
        self.declarations.push(declaration);
        Ok(())
    }

    /// Returns every declaration in registration order.
    pub fn list_tools(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    /// Looks up a declaration by name.
    pub fn get(&self, name: &str) -> Result<&ToolDeclaration, ToolError> {
        self.index
            .get(name)
            .map(|&i| &self.declarations[i])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Returns true if a tool with this name is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.declarations.len()
    }

    /// Resolves a raw invocation into a typed tool.
    pub fn parse(&self, request: &ToolInvocationRequest) -> Result<MapTool, ToolError> {
        self.parse_arguments(request.name(), request.arguments())
    }

    /// Resolves a tool name and raw arguments into a typed tool.
    pub fn parse_arguments(
        &self,
        name: &str,
        arguments: &serde_json::Value,
    ) -> Result<MapTool, ToolError> {
        self.get(name)?;
        MapTool::parse(name, arguments)
    }

    /// Renders all declarations in OpenAI function calling format.
    pub fn to_openai_tools(&self) -> Vec<serde_json::Value> {
        self.declarations
            .iter()
            .map(|tool| tool.to_openai_format())
            .collect()
    }

    /// Renders all declarations in protocol `tools/list` format.
    pub fn to_protocol_tools(&self) -> Vec<serde_json::Value> {
        self.declarations
            .iter()
            .map(|tool| tool.to_protocol_format())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::ParamType;
    use serde_json::json;

    #[test]
    fn mapping_tools_are_listed_in_registration_order() {
        let names: Vec<&str> = ToolRegistry::mapping_tools()
            .list_tools()
            .iter()
            .map(|t| t.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "geocode",
                "reverse_geocode",
                "search_places",
                "get_directions",
                "get_place_details"
            ]
        );
    }

    #[test]
    fn listing_is_stable_across_calls() {
        let registry = ToolRegistry::mapping_tools();
        let first: Vec<String> = registry.list_tools().iter().map(|t| t.name().to_string()).collect();
        let second: Vec<String> = registry.list_tools().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDeclaration::new("geocode", "first"))
            .unwrap();
        let err = registry
            .register(ToolDeclaration::new("geocode", "second"))
            .unwrap_err();
        assert_eq!(err, ToolError::DuplicateTool("geocode".to_string()));
        assert_eq!(registry.tool_count(), 1);
        assert_eq!(registry.get("geocode").unwrap().description(), "first");
    }

    #[test]
    fn from_declarations_keeps_first_duplicate() {
        let registry = ToolRegistry::from_declarations(vec![
            ToolDeclaration::new("geocode", "first"),
            ToolDeclaration::new("get_directions", "route"),
            ToolDeclaration::new("geocode", "second"),
        ]);
        assert_eq!(registry.tool_count(), 2);
        assert_eq!(registry.get("geocode").unwrap().description(), "first");
    }

    #[test]
    fn every_mapping_declaration_is_registered() {
        assert_eq!(
            ToolRegistry::mapping_tools().tool_count(),
            MapTool::declarations().len()
        );
    }

    #[test]
    fn get_unknown_tool_fails() {
        let err = ToolRegistry::mapping_tools().get("fly_to").unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("fly_to".to_string()));
    }

    #[test]
    fn parse_only_resolves_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDeclaration::new("geocode", "Geocode").with_parameter(
                    "address",
                    ParamType::String,
                    "Address",
                    true,
                ),
            )
            .unwrap();

        let request = ToolInvocationRequest::new("c1", "search_places", json!({"query": "x"}));
        assert!(matches!(
            registry.parse(&request),
            Err(ToolError::UnknownTool(_))
        ));

        let request = ToolInvocationRequest::new("c2", "geocode", json!({"address": "Krakow"}));
        assert!(matches!(registry.parse(&request), Ok(MapTool::Geocode(_))));
    }

    #[test]
    fn openai_tools_have_function_shape() {
        let tools = ToolRegistry::mapping_tools().to_openai_tools();
        assert_eq!(tools.len(), 5);
        for tool in &tools {
            assert_eq!(tool["type"], "function");
            assert!(tool["function"]["name"].is_string());
            assert_eq!(tool["function"]["parameters"]["type"], "object");
        }
    }

    #[test]
    fn protocol_tools_carry_input_schema() {
        let tools = ToolRegistry::mapping_tools().to_protocol_tools();
        let search = tools
            .iter()
            .find(|t| t["name"] == "search_places")
            .unwrap();
        assert_eq!(search["inputSchema"]["required"], json!(["query"]));
    }
}
