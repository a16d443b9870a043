//! Shared Error Types
//!
//! Errors raised while building or validating the shared data types, before any
//! backend state is touched.
//!
//! # Error Categories
//!
//! - `ValidationError` - A required identifier or field is missing or malformed
//! - `SerializationError` - JSON serialization/deserialization failures
//!
//! # Usage
//!
//! ```rust
//! use teamspace::shared::error::SharedError;
//!
//! let error = SharedError::validation("name", "Project name cannot be empty");
//! ```
use thiserror::Error;

/// Shared error types that can occur while constructing domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Reject empty or whitespace-only text for a named field
pub fn require_text(field: &str, value: &str) -> Result<String, SharedError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SharedError::validation(field, format!("Please provide a {}", field.replace('_', " "))));
    }
    Ok(trimmed.to_string())
}
