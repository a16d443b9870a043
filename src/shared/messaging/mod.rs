//! Messaging Module
//!
//! Data structures for project chat:
//!
//! - `ChatThread` - A direct-message thread keyed by its participant set
//! - `ChatMessage` - A message in a thread or in a project room
//!
//! # Usage
//!
//! ```rust
//! use teamspace::shared::messaging::{ChatMessage, ChatThread, MemberSet, MessageBody};
//! ```

pub mod message;
pub mod thread;

pub use message::{
    Attachment, ChatMessage, MessageBody, MessageKind, PageQuery, SendMessageRequest,
};
pub use thread::{ChatThread, CreateThreadRequest, MemberSet};
