//! Teamspace - Main Library
//!
//! Teamspace is the collaboration backend for shared projects: membership and
//! invitations, project and direct chat, task tracking and live co-editing
//! sessions.
//!
//! # Overview
//!
//! The heart of the crate is the real-time coordination layer:
//! - the membership/invitation state machine that gates who may act on a project
//! - the notification router that reaches a user's live connections while
//!   durably recording every notification
//! - the direct-message thread resolver that deduplicates threads by participant set
//! - the collab session registry that tracks live participant rosters
//!
//! Everything else (project and task records, notification history) is a thin
//! layer over the [`backend::store::DocumentStore`] collaborator.
//!
//! # Module Structure
//!
//! - **`shared`** - Plain data types that travel over the wire
//!   - Projects, members, notifications, chat threads and messages, tasks
//!   - Live event names
//!   - Configuration and shared error types
//!
//! - **`backend`** - Server-side code (only compiled with the `ssr` feature)
//!   - Axum HTTP server and SSE live connections
//!   - Connection directory and notification router
//!   - Membership, chat, collab, task and project services
//!   - Document store (in-memory and PostgreSQL)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use teamspace::backend::server::init::create_app;
//! use teamspace::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = create_app(config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Live state (connection directory, collab rosters) is held in sharded concurrent
//! maps so unrelated users and sessions never contend on one lock. Durable state
//! lives behind the store trait, which exposes only atomic single-document updates.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
