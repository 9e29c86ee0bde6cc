//! Tool declaration - schema and metadata for a tool.
//!
//! Declares the interface of a tool that the reasoning engine can invoke.

use serde::{Deserialize, Serialize};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    /// JSON Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// Declaration of a tool that can be invoked by the reasoning engine.
///
/// Contains the schema and documentation needed for:
/// - Reasoning engines (OpenAI-style function calling)
/// - Protocol clients (`tools/list`)
/// - Parameter validation before execution
///
/// # Examples
///
/// ```
/// use ai_maps::domain::tools::{ParamType, ToolDeclaration};
///
/// let declaration = ToolDeclaration::new("geocode", "Convert an address into coordinates")
///     .with_parameter("address", ParamType::String, "Address or place name", true);
///
/// let schema = declaration.to_json_schema();
/// assert_eq!(schema["required"][0], "address");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique name of the tool (e.g., "search_places")
    name: String,

    /// Human-readable description for the engine and docs
    description: String,

    /// Parameters in declaration order
    parameters: Vec<ParameterSpec>,
}

impl ToolDeclaration {
    /// Creates a declaration without parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Adds a parameter.
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            required,
            description: description.into(),
            allowed_values: Vec::new(),
            default: None,
        });
        self
    }

    /// Adds an optional string parameter restricted to a fixed set of values.
    pub fn with_enum_parameter(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        allowed_values: &[&str],
        default: &str,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type: ParamType::String,
            required: false,
            description: description.into(),
            allowed_values: allowed_values.iter().map(|v| v.to_string()).collect(),
            default: Some(serde_json::Value::String(default.to_string())),
        });
        self
    }

    /// Sets a default value on the most recently added parameter.
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        if let Some(last) = self.parameters.last_mut() {
            last.default = Some(value);
        }
        self
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters in declaration order.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Returns the names of required parameters.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Renders the parameters as a JSON Schema object.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut property = serde_json::json!({
                "type": param.param_type.as_str(),
                "description": param.description,
            });
            if !param.allowed_values.is_empty() {
                property["enum"] = serde_json::json!(param.allowed_values);
            }
            if let Some(default) = &param.default {
                property["default"] = default.clone();
            }
            properties.insert(param.name.clone(), property);
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_parameters(),
            "additionalProperties": false,
        })
    }

    /// Converts to OpenAI tool format.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.to_json_schema()
            }
        })
    }

    /// Converts to the protocol server's `tools/list` entry format.
    pub fn to_protocol_format(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.to_json_schema()
        })
    }
}
