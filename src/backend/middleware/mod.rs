//! Middleware Module
//!
//! - **`auth`** - Bearer-token authentication and the `AuthUser` extractor
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//! use teamspace::backend::middleware::auth_middleware;
//!
//! let protected = router.route_layer(from_fn_with_state(state.clone(), auth_middleware));
//! ```

pub mod auth;

pub use auth::{auth_middleware, authenticate, AuthUser};
