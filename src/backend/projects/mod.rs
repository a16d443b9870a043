//! Projects Module
//!
//! Project CRUD, the `{id -> {name, key}}` lookup cache, and the membership
//! access checks shared by chat, collab, membership and tasks.

pub mod cache;
pub mod handlers;
pub mod service;

pub use cache::ProjectCache;
pub use service::{load_active, require_joined, require_manager, ProjectService};
