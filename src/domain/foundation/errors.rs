//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur while validating tool arguments and value objects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' is required")]
    MissingField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Unexpected field '{field}'")]
    UnexpectedField { field: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a missing field validation error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        ValidationError::MissingField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unexpected field validation error.
    pub fn unexpected_field(field: impl Into<String>) -> Self {
        ValidationError::UnexpectedField { field: field.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("address");
        assert_eq!(format!("{}", err), "Field 'address' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("lat", -90.0, 90.0, 120.5);
        assert_eq!(
            format!("{}", err),
            "Field 'lat' must be between -90 and 90, got 120.5"
        );
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("mode", "expected one of driving, walking");
        assert_eq!(
            format!("{}", err),
            "Field 'mode' has invalid format: expected one of driving, walking"
        );
    }

    #[test]
    fn validation_error_unexpected_field_displays_correctly() {
        let err = ValidationError::unexpected_field("zoom");
        assert_eq!(format!("{}", err), "Unexpected field 'zoom'");
    }
}
