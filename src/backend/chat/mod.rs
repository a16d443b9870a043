//! Chat Backend Module
//!
//! Project-room chat and direct threads.
//!
//! - **`resolver`** - Thread resolution, message posting and listing
//! - **`handlers`** - HTTP handlers
//!
//! # Example
//!
//! ```rust,ignore
//! let resolved = chat.resolve_or_create_thread(project_id, &caller, vec![bob]).await?;
//! let body = MessageBody::text("hello")?;
//! chat.post_message(project_id, resolved.thread.id, &caller, None, body).await?;
//! ```

pub mod handlers;
pub mod resolver;

pub use resolver::{ChatService, ResolvedThread};
