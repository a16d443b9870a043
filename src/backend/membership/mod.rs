//! Membership Module
//!
//! Invitation and membership lifecycle for projects.
//!
//! ```text
//! membership/
//! ├── mod.rs       - Module exports
//! ├── machine.rs   - State machine (invite, respond, change_role, remove)
//! └── handlers.rs  - HTTP handlers
//! ```

pub mod handlers;
pub mod machine;

pub use machine::{InvitationAction, MembershipService};
