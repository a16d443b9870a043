//! Collab Session Module
//!
//! Live co-editing sessions track who is present; document content is not
//! handled here.
//!
//! - **`state`** - `SessionRegistry` (create, join, leave, teardown, invite)
//! - **`handlers`** - HTTP handlers

pub mod handlers;
pub mod state;

pub use state::{LeaveOutcome, Participant, SessionRegistry, SessionView};
