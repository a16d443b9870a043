//! Server Module
//!
//! - **`state`** - `AppState` and its `FromRef` implementations
//! - **`config`** - Store and mailer construction from `AppConfig`
//! - **`init`** - App creation and background tasks
//!
//! # Initialization Flow
//!
//! 1. **Collaborators**: PostgreSQL store (or in-memory fallback), SMTP mailer
//!    (or log-only fallback)
//! 2. **State**: directory, notification router, session registry and services
//! 3. **Background Tasks**: periodic pruning of closed live connections
//! 4. **Router**: all routes and middleware

pub mod config;
pub mod init;
pub mod state;

pub use init::create_app;
pub use state::AppState;
