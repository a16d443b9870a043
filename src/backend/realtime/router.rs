/**
 * Notification Router
 *
 * Delivers an event to its target and durably records it. Live delivery is
 * best-effort and at-most-once: a failed emit is logged at `warn` and never
 * reaches the caller. Only a failed store write is an error.
 *
 * # Targets
 *
 * - `notify_user` - every connection the directory resolves for one user
 * - `notify_project` - the project's room, minus the initiator's own connections
 * - `notify_users` - one task per recipient, outcomes collected per recipient
 * - `push_personal` / `emit_to_room` - live only, nothing persisted
 */

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use uuid::Uuid;

use super::directory::{ConnectionDirectory, ConnectionHandle};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::DocumentStore;
use crate::shared::{
    notification::{Notification, NotificationPayload, NotificationScope},
    LiveEvent, RealtimeEvent,
};

/// Per-recipient result of a fan-out
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub user: Uuid,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct NotificationRouter {
    directory: Arc<ConnectionDirectory>,
    store: Arc<dyn DocumentStore>,
}

impl NotificationRouter {
    pub fn new(directory: Arc<ConnectionDirectory>, store: Arc<dyn DocumentStore>) -> Self {
        Self { directory, store }
    }

    pub fn directory(&self) -> &Arc<ConnectionDirectory> {
        &self.directory
    }

    /// Emit to each handle, swallowing failures. Returns how many accepted.
    fn emit_all<'a>(
        handles: impl IntoIterator<Item = &'a ConnectionHandle>,
        event: &RealtimeEvent,
    ) -> usize {
        let mut delivered = 0;
        for handle in handles {
            match handle.emit(event.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("[Notify] {} to user {} dropped: {}", event.event, handle.user, e),
            }
        }
        delivered
    }

    async fn persist(&self, notification: Notification) -> BackendResult<Notification> {
        self.store
            .insert_notification(notification.clone())
            .await
            .map_err(|e| {
                tracing::error!("[Notify] Failed to persist notification {}: {}", notification.id, e);
                e
            })?;
        Ok(notification)
    }

    /// Push to every live connection of `to`, then record a USER notification.
    pub async fn notify_user(
        &self,
        to: Uuid,
        event: LiveEvent,
        payload: NotificationPayload,
    ) -> BackendResult<Notification> {
        let notification = Notification::new(NotificationScope::User(to), payload);
        let live = RealtimeEvent::new(event, serde_json::to_value(&notification)?);

        let connections = self.directory.resolve(to);
        let delivered = Self::emit_all(&connections, &live);
        tracing::debug!("[Notify] user={} live={}/{}", to, delivered, connections.len());

        self.persist(notification).await
    }

    /// Broadcast into the project's room, skipping connections owned by the
    /// initiator, then record a PROJECT notification.
    pub async fn notify_project(
        &self,
        project: Uuid,
        event: LiveEvent,
        payload: NotificationPayload,
        initiator: Uuid,
    ) -> BackendResult<Notification> {
        let notification = Notification::new(NotificationScope::Project(project), payload);
        let live = RealtimeEvent::new(event, serde_json::to_value(&notification)?);

        let delivered = self.broadcast(project, &live, Some(initiator));
        tracing::debug!("[Notify] project={} live={}", project, delivered);

        self.persist(notification).await
    }

    /// One spawned task per recipient. A failure for one recipient is recorded
    /// in its outcome and never stops the others. Outcomes are unordered.
    pub async fn notify_users<F>(
        &self,
        recipients: &[Uuid],
        event: LiveEvent,
        payload_for: F,
    ) -> Vec<DeliveryOutcome>
    where
        F: Fn(Uuid) -> NotificationPayload,
    {
        let mut tasks = JoinSet::new();
        for &user in recipients {
            let router = self.clone();
            let payload = payload_for(user);
            tasks.spawn(async move { (user, router.notify_user(user, event, payload).await) });
        }

        let mut outcomes = Vec::with_capacity(recipients.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((user, Ok(notification))) => outcomes.push(DeliveryOutcome {
                    user,
                    delivered: true,
                    notification: Some(notification.id),
                    error: None,
                }),
                Ok((user, Err(e))) => {
                    tracing::warn!("[Notify] Fan-out to {} failed: {}", user, e);
                    outcomes.push(DeliveryOutcome {
                        user,
                        delivered: false,
                        notification: None,
                        error: Some(e.message()),
                    });
                }
                Err(join_error) => {
                    tracing::error!("[Notify] Fan-out task aborted: {}", join_error);
                }
            }
        }

        // A panicked task loses its user id; report it as undelivered
        for &user in recipients {
            if !outcomes.iter().any(|o| o.user == user) {
                outcomes.push(DeliveryOutcome {
                    user,
                    delivered: false,
                    notification: None,
                    error: Some(BackendError::state("Delivery task aborted").message()),
                });
            }
        }
        outcomes
    }

    /// `personal-chat` push; live only. Returns the number of connections reached.
    pub fn push_personal(&self, to: Uuid, payload: serde_json::Value) -> usize {
        let live = RealtimeEvent::personal_chat(payload);
        Self::emit_all(&self.directory.resolve(to), &live)
    }

    /// Live-only room broadcast
    pub fn emit_to_room(
        &self,
        project: Uuid,
        event: LiveEvent,
        payload: serde_json::Value,
        initiator: Option<Uuid>,
    ) -> usize {
        let live = RealtimeEvent::new(event, payload);
        self.broadcast(project, &live, initiator)
    }

    fn broadcast(&self, project: Uuid, live: &RealtimeEvent, skip_user: Option<Uuid>) -> usize {
        let room = self.directory.room_connections(project);
        let targets = room.iter().filter(|h| Some(h.user) != skip_user);
        Self::emit_all(targets, live)
    }

    /// Notification history for `user`: their own USER notifications plus
    /// PROJECT notifications of every project they have joined. Newest first.
    pub async fn list_for_user(&self, user: Uuid, limit: usize) -> BackendResult<Vec<Notification>> {
        let mut scopes = vec![NotificationScope::User(user)];
        scopes.extend(
            self.store
                .list_projects_for_member(user)
                .await?
                .into_iter()
                .map(|p| NotificationScope::Project(p.id)),
        );
        self.store.list_notifications(&scopes, limit).await
    }
}
