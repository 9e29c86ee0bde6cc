//! Tool results fed back to the reasoning engine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::InvocationId;
use crate::domain::mapping::{ErrorKind, LocationSummary, MappingError, MappingResult};

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The operation succeeded with a normalized result.
    Success(MappingResult),

    /// The backend found nothing. Not an error from the engine's view.
    NoResults { message: String },

    /// The invocation failed locally.
    Failed { error_kind: ErrorKind, message: String },
}

/// The result of one invocation, tied back to its request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    invocation_id: InvocationId,
    tool_name: String,
    outcome: ToolOutcome,
}

impl ToolResult {
    /// Creates a result with an explicit outcome.
    pub fn new(invocation_id: InvocationId, tool_name: impl Into<String>, outcome: ToolOutcome) -> Self {
        Self {
            invocation_id,
            tool_name: tool_name.into(),
            outcome,
        }
    }

    /// Creates a result from the mapping adapter's return value.
    pub fn from_mapping(
        invocation_id: InvocationId,
        tool_name: impl Into<String>,
        result: Result<MappingResult, MappingError>,
    ) -> Self {
        let outcome = match result {
            Ok(mapped) => ToolOutcome::Success(mapped),
            Err(MappingError::NoResultsFound(message)) => ToolOutcome::NoResults { message },
            Err(err) => ToolOutcome::Failed {
                error_kind: err.kind(),
                message: err.to_string(),
            },
        };
        Self::new(invocation_id, tool_name, outcome)
    }

    /// Returns the invocation this result answers.
    pub fn invocation_id(&self) -> &InvocationId {
        &self.invocation_id
    }

    /// Returns the tool name.
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> &ToolOutcome {
        &self.outcome
    }

    /// Returns true if the invocation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success(_))
    }

    /// Locations mentioned by a successful result.
    pub fn locations(&self) -> &[LocationSummary] {
        match &self.outcome {
            ToolOutcome::Success(result) => result.locations(),
            _ => &[],
        }
    }

    /// Renders the JSON payload sent back to the engine.
    pub fn to_payload(&self) -> serde_json::Value {
        match &self.outcome {
            ToolOutcome::Success(result) => serde_json::json!({
                "status": "success",
                "tool": self.tool_name,
                "summary": result.summary(),
                "detail": result.detail(),
            }),
            ToolOutcome::NoResults { message } => serde_json::json!({
                "status": "no_results",
                "tool": self.tool_name,
                "message": message,
            }),
            ToolOutcome::Failed { error_kind, message } => serde_json::json!({
                "status": "error",
                "tool": self.tool_name,
                "error_kind": error_kind,
                "message": message,
            }),
        }
    }
}
