//! Backend Error Module
//!
//! Error types for the coordination layer and their HTTP rendering.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and foreign error conversions
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use teamspace::backend::error::BackendError;
//! use axum::response::Response;
//!
//! # async fn example() -> Result<Response, BackendError> {
//! Err(BackendError::forbidden("Only owners and admins can invite members"))
//! # }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;

/// Result alias used throughout the backend
pub type BackendResult<T> = Result<T, BackendError>;
