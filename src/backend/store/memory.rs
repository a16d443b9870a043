//! In-memory document store.
//!
//! Per-document atomicity comes from DashMap shard locks: a mutation closure runs
//! while the entry's write guard is held, and no `.await` happens under a guard.
//! Append-only collections sit behind a tokio `RwLock`.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, ProjectMutation, TaskLookup};
use crate::backend::error::{BackendError, BackendResult};
use crate::shared::{
    messaging::{ChatMessage, ChatThread},
    notification::{Notification, NotificationScope},
    project::Project,
    task::{Task, TaskUpdate},
    user::User,
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    projects: DashMap<Uuid, Project>,
    notifications: RwLock<Vec<Notification>>,
    threads: DashMap<Uuid, ChatThread>,
    /// `(project, member_key)` -> thread id
    thread_keys: DashMap<(Uuid, String), Uuid>,
    messages: RwLock<Vec<ChatMessage>>,
    counters: DashMap<String, i64>,
    tasks: DashMap<Uuid, Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored threads; used by tests asserting deduplication
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_user(&self, user: User) -> BackendResult<User> {
        let taken = self
            .users
            .iter()
            .any(|u| u.email == user.email && u.id != user.id);
        if taken {
            return Err(BackendError::conflict("Email is already registered"));
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> BackendResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_users(&self, ids: &[Uuid]) -> BackendResult<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> BackendResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn insert_project(&self, project: Project) -> BackendResult<Project> {
        match self.projects.entry(project.id) {
            Entry::Occupied(_) => Err(BackendError::conflict("Project already exists")),
            Entry::Vacant(slot) => {
                slot.insert(project.clone());
                Ok(project)
            }
        }
    }

    async fn get_project(&self, id: Uuid) -> BackendResult<Option<Project>> {
        Ok(self.projects.get(&id).map(|p| p.clone()))
    }

    async fn list_projects_for_member(&self, user: Uuid) -> BackendResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| p.is_active() && p.joined_member(user).is_some())
            .map(|p| p.clone())
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn modify_project(&self, id: Uuid, mutation: ProjectMutation) -> BackendResult<Project> {
        let mut entry = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("Project not found"))?;
        let mut draft = entry.clone();
        mutation(&mut draft)?;
        draft.updated_at = Utc::now();
        *entry = draft.clone();
        Ok(draft)
    }

    async fn insert_notification(&self, notification: Notification) -> BackendResult<()> {
        self.notifications.write().await.push(notification);
        Ok(())
    }

    async fn list_notifications(
        &self,
        scopes: &[NotificationScope],
        limit: usize,
    ) -> BackendResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| scopes.contains(&n.scope))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_thread_if_absent(&self, thread: ChatThread) -> BackendResult<(ChatThread, bool)> {
        match self.thread_keys.entry((thread.project, thread.member_key())) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                drop(slot);
                let existing = self
                    .threads
                    .get(&id)
                    .map(|t| t.clone())
                    .ok_or_else(|| BackendError::state("Thread index points at a missing thread"))?;
                Ok((existing, false))
            }
            Entry::Vacant(slot) => {
                self.threads.insert(thread.id, thread.clone());
                slot.insert(thread.id);
                Ok((thread, true))
            }
        }
    }

    async fn get_thread(&self, id: Uuid) -> BackendResult<Option<ChatThread>> {
        Ok(self.threads.get(&id).map(|t| t.clone()))
    }

    async fn list_threads_for_member(&self, project: Uuid, user: Uuid) -> BackendResult<Vec<ChatThread>> {
        let mut threads: Vec<ChatThread> = self
            .threads
            .iter()
            .filter(|t| t.project == project && t.members.contains(user))
            .map(|t| t.clone())
            .collect();
        threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(threads)
    }

    async fn set_thread_last_message(&self, thread: Uuid, message: Uuid) -> BackendResult<()> {
        let mut entry = self
            .threads
            .get_mut(&thread)
            .ok_or_else(|| BackendError::not_found("Chat not found"))?;
        entry.last_message = Some(message);
        Ok(())
    }

    async fn append_message(&self, mut message: ChatMessage) -> BackendResult<ChatMessage> {
        let mut messages = self.messages.write().await;
        message.seq = messages.len() as u64 + 1;
        messages.push(message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> BackendResult<Option<ChatMessage>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_project_messages(
        &self,
        project: Uuid,
        limit: usize,
        skip: usize,
    ) -> BackendResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let mut room: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.project == project && !m.is_direct())
            .cloned()
            .collect();
        room.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(room.into_iter().skip(skip).take(limit).collect())
    }

    async fn list_thread_messages(&self, thread: Uuid) -> BackendResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let mut list: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.chat_id == Some(thread))
            .cloned()
            .collect();
        list.sort_by_key(|m| m.order_key());
        Ok(list)
    }

    async fn mark_message_read(&self, id: Uuid, user: Uuid) -> BackendResult<ChatMessage> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| BackendError::not_found("Message not found"))?;
        message.mark_read_by(user);
        Ok(message.clone())
    }

    async fn increment_counter(&self, name: &str) -> BackendResult<i64> {
        let mut value = self.counters.entry(name.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn insert_task(&self, task: Task) -> BackendResult<Task> {
        if let Some(key) = &task.task_key {
            let duplicate = self
                .tasks
                .iter()
                .any(|t| t.project == task.project && t.task_key.as_ref() == Some(key));
            if duplicate {
                return Err(BackendError::conflict(format!("Task {} already exists", key)));
            }
        }
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, project: Uuid, lookup: &TaskLookup) -> BackendResult<Option<Task>> {
        Ok(self
            .tasks
            .iter()
            .find(|t| t.project == project && lookup.matches(&t))
            .map(|t| t.clone()))
    }

    async fn list_tasks(&self, project: Uuid) -> BackendResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.project == project)
            .map(|t| t.clone())
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    async fn update_task(
        &self,
        project: Uuid,
        lookup: &TaskLookup,
        update: TaskUpdate,
    ) -> BackendResult<Task> {
        let id = self
            .tasks
            .iter()
            .find(|t| t.project == project && lookup.matches(&t))
            .map(|t| t.id)
            .ok_or_else(|| BackendError::not_found("Task not found"))?;
        let mut entry = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("Task not found"))?;
        let mut draft = entry.clone();
        draft.apply(&update)?;
        *entry = draft.clone();
        Ok(draft)
    }
}
