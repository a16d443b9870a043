//! Backend Module
//!
//! All server-side code: the Axum HTTP server, live connections, the
//! coordination services and the document store. Only compiled with the
//! `ssr` feature.
//!
//! # Architecture
//!
//! - **`server`** - Initialization, `AppState`, collaborator loading
//! - **`routes`** - Route table and router assembly
//! - **`realtime`** - Connection directory, notification router, SSE endpoint
//! - **`membership`** - Invitation and membership state machine
//! - **`chat`** - Project room chat and direct-message threads
//! - **`collab`** - Live collab session rosters
//! - **`tasks`** - Task key allocation and task records
//! - **`projects`** - Project records and the project summary cache
//! - **`store`** - `DocumentStore` trait with in-memory and PostgreSQL backends
//! - **`mail`** - Outbound invitation email
//! - **`auth`** - JWT session tokens
//! - **`middleware`** - Authentication middleware and `AuthUser` extractor
//! - **`error`** - `BackendError` and its HTTP mapping
//! - **`extract`** - Json/Path/Query extractors that reject with `BackendError`
//! - **`response`** - Success envelope
//!
//! # Ordering
//!
//! A durable write always completes before any notification that depends on
//! it is emitted. Live delivery is best-effort; persistence is not.

pub mod auth;
pub mod chat;
pub mod collab;
pub mod error;
pub mod extract;
pub mod mail;
pub mod membership;
pub mod middleware;
pub mod projects;
pub mod realtime;
pub mod response;
pub mod routes;
pub mod server;
pub mod store;
pub mod tasks;
