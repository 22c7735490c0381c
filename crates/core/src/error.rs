//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DataValidationError>;

/// Data validation failure.
///
/// Raised when an operation is called on an entity in a state that does not
/// allow it (e.g. updating a record that was never persisted), or when a
/// dictionary value cannot be represented by the target field.
/// Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DataValidationError(String);

impl DataValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// A dictionary value for `field` had the wrong shape.
    pub fn invalid_field(field: &str, expected: &str, found: &serde_json::Value) -> Self {
        Self(format!("invalid value for `{field}`: expected {expected}, found {found}"))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
