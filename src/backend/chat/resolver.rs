/**
 * Chat Thread Resolver
 *
 * Direct threads are identified within a project by their exact participant
 * set. Resolution is one `create_thread_if_absent` call on the store's
 * `(project, member_key)` uniqueness constraint, so concurrent requests for
 * the same set always converge on a single thread.
 *
 * # Ordering
 *
 * Messages are ordered by `(sent_at, seq)`: `sent_at` is stamped here and
 * `seq` is the store's insertion counter. Project-room pages are returned
 * newest first; thread history is returned oldest first.
 *
 * # Live delivery
 *
 * Thread messages go out as `personal-chat` to each receiver; room messages as
 * `chat-message` to the project room. Neither is recorded as a notification;
 * the message itself is the durable record.
 */

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::projects::{load_active, require_joined, ProjectCache};
use crate::backend::realtime::NotificationRouter;
use crate::backend::store::DocumentStore;
use crate::shared::{
    config::AppConfig,
    messaging::{ChatMessage, ChatThread, MessageBody, PageQuery},
    project::Project,
    user::Caller,
    LiveEvent,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Result of resolving a participant set
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedThread {
    #[serde(flatten)]
    pub thread: ChatThread,
    pub created: bool,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    router: NotificationRouter,
    cache: ProjectCache,
    config: Arc<AppConfig>,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        router: NotificationRouter,
        cache: ProjectCache,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            router,
            cache,
            config,
        }
    }

    async fn chat_project(&self, project_id: Uuid, user: Uuid) -> BackendResult<Project> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        require_joined(&project, user)?;
        if !project.chat_enabled {
            return Err(BackendError::forbidden("Chat is disabled for this project"));
        }
        Ok(project)
    }

    async fn thread_in_project(&self, project_id: Uuid, thread_id: Uuid) -> BackendResult<ChatThread> {
        self.store
            .get_thread(thread_id)
            .await?
            .filter(|t| t.project == project_id)
            .ok_or_else(|| BackendError::not_found("Chat not found"))
    }

    /// Find the thread whose members are exactly `{sender} ∪ receivers`, creating it if absent
    pub async fn resolve_or_create_thread(
        &self,
        project_id: Uuid,
        sender: &Caller,
        receivers: Vec<Uuid>,
    ) -> BackendResult<ResolvedThread> {
        let project = self.chat_project(project_id, sender.id).await?;

        let mut receivers: Vec<Uuid> = receivers.into_iter().filter(|r| *r != sender.id).collect();
        receivers.sort();
        receivers.dedup();
        if receivers.is_empty() {
            return Err(BackendError::validation("receiver", "Please provide a receiver"));
        }
        if receivers.iter().any(|r| project.joined_member(*r).is_none()) {
            return Err(BackendError::validation(
                "receiver",
                "Every receiver must be a member of this project",
            ));
        }

        let candidate = ChatThread::new(project_id, sender.id, receivers);
        let (thread, created) = self.store.create_thread_if_absent(candidate).await?;
        if created {
            tracing::info!("[Chat] New thread {} in {} ({} members)", thread.id, project_id, thread.members.len());
        }
        Ok(ResolvedThread { thread, created })
    }

    /// Append a message to a direct thread and push it to its receivers.
    ///
    /// Receivers default to every other thread member and must be a subset of
    /// the thread.
    pub async fn post_message(
        &self,
        project_id: Uuid,
        thread_id: Uuid,
        sender: &Caller,
        receivers: Option<Vec<Uuid>>,
        body: MessageBody,
    ) -> BackendResult<ChatMessage> {
        self.chat_project(project_id, sender.id).await?;
        let thread = self.thread_in_project(project_id, thread_id).await?;
        if !thread.members.contains(sender.id) {
            return Err(BackendError::forbidden("You are not part of this chat"));
        }

        let receivers = match receivers {
            Some(list) => {
                if list.iter().any(|r| !thread.members.contains(*r) || *r == sender.id) {
                    return Err(BackendError::validation(
                        "receiver",
                        "Receivers must be other members of this chat",
                    ));
                }
                list
            }
            None => thread.others(sender.id),
        };

        let message = ChatMessage::direct(thread.id, project_id, sender.id, receivers, body);
        let message = self.store.append_message(message).await?;
        self.store.set_thread_last_message(thread.id, message.id).await?;

        let project = self.cache.get(project_id).await?;
        let payload = serde_json::json!({
            "message": message,
            "sender": sender.sender_payload(),
            "project": project,
        });
        let mut reached = 0;
        for receiver in &message.receiver {
            reached += self.router.push_personal(*receiver, payload.clone());
        }
        tracing::debug!("[Chat] Thread message {} reached {} connections", message.id, reached);

        Ok(message)
    }

    /// Append a message to the project room and broadcast it
    pub async fn post_project_message(
        &self,
        project_id: Uuid,
        sender: &Caller,
        body: MessageBody,
    ) -> BackendResult<ChatMessage> {
        self.chat_project(project_id, sender.id).await?;

        let message = ChatMessage::room(project_id, sender.id, body);
        let message = self.store.append_message(message).await?;

        let payload = serde_json::json!({
            "message": message,
            "sender": sender.sender_payload(),
        });
        self.router
            .emit_to_room(project_id, LiveEvent::ChatMessage, payload, Some(sender.id));
        Ok(message)
    }

    /// Newest first, `limit` clamped to the configured page maximum
    pub async fn list_project_messages(
        &self,
        project_id: Uuid,
        caller: &Caller,
        page: PageQuery,
    ) -> BackendResult<Vec<ChatMessage>> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        require_joined(&project, caller.id)?;

        let limit = page
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, self.config.chat_page_max);
        let skip = page.skip.unwrap_or(0);
        self.store.list_project_messages(project_id, limit, skip).await
    }

    pub async fn list_threads(&self, project_id: Uuid, caller: &Caller) -> BackendResult<Vec<ChatThread>> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        require_joined(&project, caller.id)?;
        self.store.list_threads_for_member(project_id, caller.id).await
    }

    /// Oldest first
    pub async fn list_thread_messages(
        &self,
        project_id: Uuid,
        thread_id: Uuid,
        caller: &Caller,
    ) -> BackendResult<Vec<ChatMessage>> {
        let thread = self.thread_in_project(project_id, thread_id).await?;
        if !thread.members.contains(caller.id) {
            return Err(BackendError::forbidden("You are not part of this chat"));
        }
        self.store.list_thread_messages(thread.id).await
    }

    /// Add the caller to a message's read-by set
    pub async fn mark_read(&self, message_id: Uuid, caller: &Caller) -> BackendResult<ChatMessage> {
        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Message not found"))?;

        match message.chat_id {
            Some(thread_id) => {
                let thread = self.thread_in_project(message.project, thread_id).await?;
                if !thread.members.contains(caller.id) {
                    return Err(BackendError::forbidden("You are not part of this chat"));
                }
            }
            None => {
                let project = load_active(self.store.as_ref(), message.project).await?;
                require_joined(&project, caller.id)?;
            }
        }

        self.store.mark_message_read(message_id, caller.id).await
    }
}
