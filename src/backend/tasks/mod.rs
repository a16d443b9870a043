//! Tasks Module
//!
//! - **`allocator`** - `{KEY}-{n}` task keys from an atomic counter
//! - **`service`** - Add, list, get and update tasks
//! - **`handlers`** - HTTP handlers

pub mod allocator;
pub mod handlers;
pub mod service;

pub use allocator::TaskKeyAllocator;
pub use service::TaskService;
