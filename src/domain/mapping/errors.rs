//! Mapping operation errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::tools::ToolError;

/// Stable machine-readable category of a tool-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    InvalidArguments,
    NoResultsFound,
    BackendError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::NoResultsFound => "no_results_found",
            ErrorKind::BackendError => "backend_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single mapping tool invocation.
///
/// All variants are local to one invocation: the orchestration loop turns
/// them into tool results rather than failing the query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// The requested tool is not declared.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool schema, or the backend rejected them.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The backend answered with an empty result set.
    #[error("no results found: {0}")]
    NoResultsFound(String),

    /// Transport failure, timeout, or provider-side rejection.
    #[error("backend error ({status}): {message}")]
    BackendError { status: String, message: String },
}

impl MappingError {
    /// Creates a backend error.
    pub fn backend(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendError {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Creates a backend timeout error.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::backend("timeout", format!("no response within {}ms", after.as_millis()))
    }

    /// Creates a no-results outcome.
    pub fn no_results(message: impl Into<String>) -> Self {
        Self::NoResultsFound(message.into())
    }

    /// Creates an invalid arguments error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// Returns the stable error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MappingError::UnknownTool(_) => ErrorKind::UnknownTool,
            MappingError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            MappingError::NoResultsFound(_) => ErrorKind::NoResultsFound,
            MappingError::BackendError { .. } => ErrorKind::BackendError,
        }
    }

    /// Returns true if repeating the same call may succeed.
    ///
    /// Timeouts, transport failures, server errors and rate limiting are
    /// transient; rejections of the request itself are not.
    pub fn is_transient(&self) -> bool {
        match self {
            MappingError::BackendError { status, .. } => {
                matches!(
                    status.as_str(),
                    "timeout" | "transport" | "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR" | "429"
                ) || status.starts_with('5')
            }
            _ => false,
        }
    }
}

impl From<ToolError> for MappingError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::UnknownTool(name) => MappingError::UnknownTool(name),
            ToolError::InvalidArguments { tool, reason } => {
                MappingError::InvalidArguments(format!("{}: {}", tool, reason))
            }
            ToolError::DuplicateTool(name) => {
                MappingError::InvalidArguments(format!("duplicate tool declaration: {}", name))
            }
        }
    }
}
