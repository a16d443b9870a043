//! Shared Module
//!
//! Types shared by every part of the backend: the domain records that are stored
//! and returned over HTTP, the live event envelope, and configuration.
//!
//! # Overview
//!
//! Nothing here touches the store or the network. Constructors validate their
//! input and return `SharedError` so that handlers can reject bad requests before
//! any state changes.

/// Real-time event envelope
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Users and the authenticated caller
pub mod user;

/// Projects and their members
pub mod project;

/// Durable notification records
pub mod notification;

/// Direct threads and chat messages
pub mod messaging;

/// Task records
pub mod task;

pub use config::{AppConfig, AppConfigBuilder, ConfigError, TaskCounterScope};
pub use error::SharedError;
pub use event::{LiveEvent, RealtimeEvent};
pub use notification::{Notification, NotificationPayload, NotificationScope};
pub use project::{Member, MemberRole, MemberStatus, Project, ProjectStatus, ProjectType};
pub use task::{Task, TaskStatus, TaskType};
pub use user::{Caller, User};
