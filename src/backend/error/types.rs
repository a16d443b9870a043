/**
 * Backend Error Types
 *
 * Every operation of the coordination layer fails with one of these variants.
 * Each variant carries a stable HTTP status so handlers can return the error
 * directly.
 *
 * # Error Categories
 *
 * | Variant | Status | Raised when |
 * |---|---|---|
 * | `Validation` | 400 | a required identifier or field is missing |
 * | `Unauthorized` | 401 | no usable bearer token |
 * | `Forbidden` | 403 | the caller may not perform this transition |
 * | `NotFound` | 404 | project, user, thread, task or session absent |
 * | `Conflict` | 409 | duplicate membership, double response, ownerless result |
 * | `Transport` | 500 | email or live push could not be sent |
 * | `Database` / `State` / `Serialization` | 500 | store or internal failure |
 *
 * Live-push transport failures are normally swallowed by the notification
 * router; only the invitation email surfaces `Transport` to the caller.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use teamspace::backend::error::BackendError;
///
/// let err = BackendError::not_found("Project not found");
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or malformed input, raised by shared constructors
    #[error(transparent)]
    Validation(#[from] SharedError),

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Outbound email or live emit failed
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// State management error (closed channel, poisoned invariant)
    #[error("State error: {message}")]
    State { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(SharedError::validation(field, message))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Create a new state error
    ///
    /// ```rust
    /// use teamspace::backend::error::BackendError;
    ///
    /// let err = BackendError::state("Connection closed");
    /// ```
    pub fn state(message: impl Into<String>) -> Self {
        Self::State { message: message.into() }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(SharedError::ValidationError { .. }) => StatusCode::BAD_REQUEST,
            Self::Validation(SharedError::SerializationError { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Transport { .. }
            | Self::State { .. }
            | Self::Database(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the human-readable message returned to the client
    pub fn message(&self) -> String {
        match self {
            Self::Validation(SharedError::ValidationError { message, .. }) => message.clone(),
            Self::Validation(err) => err.to_string(),
            Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Transport { message }
            | Self::State { message } => message.clone(),
            // Store internals stay in the log
            Self::Database(_) => "Something went wrong".to_string(),
            Self::Serialization(err) => err.to_string(),
        }
    }
}
