//! Tool registry errors.

use thiserror::Error;

/// Errors raised at the tool registry boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// No tool with this name is declared.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments do not satisfy the tool's parameter schema.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// A tool with this name is already registered.
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
}

impl ToolError {
    /// Creates an invalid arguments error.
    pub fn invalid(tool: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}
