//! Tool invocation requests produced by the reasoning engine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::InvocationId;

/// A request from the reasoning engine to run one tool.
///
/// Arguments are kept as the engine sent them. When the engine produced
/// arguments that are not valid JSON, the raw text is kept as a JSON string
/// so validation can report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Engine-assigned identifier, echoed back with the result
    id: InvocationId,

    /// Name of the tool to invoke
    name: String,

    /// Raw arguments
    arguments: serde_json::Value,
}

impl ToolInvocationRequest {
    /// Creates a new invocation request.
    pub fn new(
        id: impl Into<InvocationId>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Creates a request from the engine's serialized argument text.
    pub fn from_raw_arguments(
        id: impl Into<InvocationId>,
        name: impl Into<String>,
        raw: &str,
    ) -> Self {
        let arguments = if raw.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
        };
        Self::new(id, name, arguments)
    }

    /// Returns the invocation identifier.
    pub fn id(&self) -> &InvocationId {
        &self.id
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw arguments.
    pub fn arguments(&self) -> &serde_json::Value {
        &self.arguments
    }

    /// Serializes the arguments the way the engine expects them echoed back.
    pub fn arguments_text(&self) -> String {
        match &self.arguments {
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}
