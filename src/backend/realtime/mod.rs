//! Real-time Module
//!
//! Live delivery to connected clients over Server-Sent Events.
//!
//! - **`directory`** - user → live connections, project → room connections
//! - **`router`** - notification delivery (live emit plus durable record)
//! - **`subscription`** - the `GET /realtime` stream and notification history
//!
//! Clients listen for three event names: `new-notification`, `chat-message`
//! and `personal-chat`.

pub mod directory;
pub mod router;
pub mod subscription;

pub use directory::{ConnectionDirectory, ConnectionHandle, ConnectionId};
pub use router::{DeliveryOutcome, NotificationRouter};
pub use subscription::{handle_realtime_subscription, list_notifications};
