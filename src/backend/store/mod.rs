//! Document Store
//!
//! The durable-store boundary consumed by the coordination layer. Every write
//! that must be atomic is a single call on this trait:
//!
//! - `modify_project` runs a check-and-mutate closure against one project
//!   document with no interleaving writer
//! - `create_thread_if_absent` inserts under a uniqueness constraint on
//!   `(project, member_key)`
//! - `increment_counter` is an atomic increment-and-return
//!
//! Two implementations are provided:
//!
//! - `MemoryStore` - DashMap-backed, used in tests and when no database is configured
//! - `PgStore` - PostgreSQL via sqlx, documents kept as JSONB

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::shared::{
    messaging::{ChatMessage, ChatThread},
    notification::{Notification, NotificationScope},
    project::Project,
    task::{Task, TaskUpdate},
    user::User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Check-and-mutate step applied to a single project document.
///
/// Returning an error leaves the stored document untouched.
pub type ProjectMutation =
    Box<dyn FnOnce(&mut Project) -> BackendResult<()> + Send + 'static>;

/// How a task is addressed in a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLookup {
    Key(String),
    Id(Uuid),
}

impl TaskLookup {
    /// Task ids are UUIDs; anything else is treated as a key
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => TaskLookup::Id(id),
            Err(_) => TaskLookup::Key(raw.trim().to_ascii_uppercase()),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskLookup::Key(key) => task.task_key.as_deref() == Some(key.as_str()),
            TaskLookup::Id(id) => task.id == *id,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // Users are owned by the identity service; the store only reads them here.
    async fn insert_user(&self, user: User) -> BackendResult<User>;
    async fn get_user(&self, id: Uuid) -> BackendResult<Option<User>>;
    async fn get_users(&self, ids: &[Uuid]) -> BackendResult<Vec<User>>;
    async fn find_user_by_email(&self, email: &str) -> BackendResult<Option<User>>;

    async fn insert_project(&self, project: Project) -> BackendResult<Project>;
    async fn get_project(&self, id: Uuid) -> BackendResult<Option<Project>>;
    /// Active projects where `user` is a joined member
    async fn list_projects_for_member(&self, user: Uuid) -> BackendResult<Vec<Project>>;
    /// Apply `mutation` atomically; NotFound if the project does not exist
    async fn modify_project(&self, id: Uuid, mutation: ProjectMutation) -> BackendResult<Project>;

    async fn insert_notification(&self, notification: Notification) -> BackendResult<()>;
    /// Newest first
    async fn list_notifications(
        &self,
        scopes: &[NotificationScope],
        limit: usize,
    ) -> BackendResult<Vec<Notification>>;

    /// Insert unless a thread with the same `(project, member_key)` exists.
    /// Returns the stored thread and whether it was created by this call.
    async fn create_thread_if_absent(&self, thread: ChatThread) -> BackendResult<(ChatThread, bool)>;
    async fn get_thread(&self, id: Uuid) -> BackendResult<Option<ChatThread>>;
    async fn list_threads_for_member(&self, project: Uuid, user: Uuid) -> BackendResult<Vec<ChatThread>>;
    async fn set_thread_last_message(&self, thread: Uuid, message: Uuid) -> BackendResult<()>;

    /// Append and return the message with its assigned `seq`
    async fn append_message(&self, message: ChatMessage) -> BackendResult<ChatMessage>;
    async fn get_message(&self, id: Uuid) -> BackendResult<Option<ChatMessage>>;
    /// Project-room messages, newest first
    async fn list_project_messages(
        &self,
        project: Uuid,
        limit: usize,
        skip: usize,
    ) -> BackendResult<Vec<ChatMessage>>;
    /// Thread messages, oldest first
    async fn list_thread_messages(&self, thread: Uuid) -> BackendResult<Vec<ChatMessage>>;
    async fn mark_message_read(&self, id: Uuid, user: Uuid) -> BackendResult<ChatMessage>;

    /// Atomically increment the named counter and return the new value
    async fn increment_counter(&self, name: &str) -> BackendResult<i64>;

    async fn insert_task(&self, task: Task) -> BackendResult<Task>;
    async fn get_task(&self, project: Uuid, lookup: &TaskLookup) -> BackendResult<Option<Task>>;
    async fn list_tasks(&self, project: Uuid) -> BackendResult<Vec<Task>>;
    async fn update_task(
        &self,
        project: Uuid,
        lookup: &TaskLookup,
        update: TaskUpdate,
    ) -> BackendResult<Task>;
}
