//! Authentication Module
//!
//! Caller identity comes from a bearer JWT. This module only verifies tokens;
//! sign-up and login belong to the identity service.
//!
//! ```text
//! auth/
//! ├── mod.rs       - Module exports
//! └── sessions.rs  - JWT claims, create and verify
//! ```

/// JWT token management
pub mod sessions;

pub use sessions::{create_token, verify_token, Claims};
