/**
 * Live Connection Handler
 *
 * `GET /realtime` opens one Server-Sent Events stream for the authenticated
 * caller. The stream is registered in the connection directory for as long as
 * the response body lives; when the client disconnects axum drops the stream,
 * and the guard inside it unregisters the connection and leaves its rooms.
 *
 * # Query Parameters
 *
 * - `rooms` - comma-separated project ids whose room this connection joins.
 *   Only projects where the caller is a JOINED member are joined; others are
 *   skipped. A malformed id is a 400.
 * - `token` - bearer token, for clients that cannot set headers
 *
 * # Example Response
 *
 * ```http
 * HTTP/1.1 200 OK
 * Content-Type: text/event-stream
 *
 * event: new-notification
 * data: {"event":"new-notification","payload":{...},"timestamp":"..."}
 * ```
 */

use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::directory::{ConnectionDirectory, ConnectionHandle};
use super::router::NotificationRouter;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::extract::ApiQuery;
use crate::backend::middleware::AuthUser;
use crate::backend::response::ApiResponse;
use crate::backend::server::state::AppState;
use crate::shared::{Notification, RealtimeEvent};

const NOTIFICATION_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct RealtimeQuery {
    pub rooms: Option<String>,
}

impl RealtimeQuery {
    pub fn room_ids(&self) -> BackendResult<Vec<Uuid>> {
        let Some(rooms) = self.rooms.as_deref() else {
            return Ok(Vec::new());
        };
        rooms
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|_| BackendError::validation("rooms", format!("'{}' is not a project id", s)))
            })
            .collect()
    }
}

/// Unregisters the connection when the stream is dropped
struct ConnectionGuard {
    directory: Arc<ConnectionDirectory>,
    handle: ConnectionHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        tracing::info!("[Realtime] Connection {} for {} closed", self.handle.id, self.handle.user);
        self.directory.unregister(self.handle.user, self.handle.id);
    }
}

fn to_sse(event: &RealtimeEvent) -> Option<Event> {
    match Event::default().event(event.event.as_str()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::error!("[Realtime] Failed to serialize {} event: {:?}", event.event, e);
            None
        }
    }
}

/// Handle a live connection (GET /realtime)
pub async fn handle_realtime_subscription(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiQuery(query): ApiQuery<RealtimeQuery>,
) -> BackendResult<Sse<impl tokio_stream::Stream<Item = Result<Event, axum::Error>>>> {
    let requested = query.room_ids()?;

    let (handle, rx) = state.directory.connect(caller.id);
    let guard = ConnectionGuard {
        directory: state.directory.clone(),
        handle: handle.clone(),
    };

    for project_id in requested {
        match state.store.get_project(project_id).await? {
            Some(project) if project.is_active() && project.joined_member(caller.id).is_some() => {
                state.directory.join_room(project_id, &handle);
            }
            _ => {
                tracing::warn!("[Realtime] {} may not join room {}, skipping", caller.id, project_id);
            }
        }
    }

    tracing::info!("[Realtime] Connection {} open for {}", handle.id, caller.id);

    let stream = stream::unfold(
        (rx, guard),
        |(mut rx, guard): (mpsc::UnboundedReceiver<RealtimeEvent>, ConnectionGuard)| async move {
            loop {
                let event = rx.recv().await?;
                if let Some(sse) = to_sse(&event) {
                    return Some((Ok(sse), (rx, guard)));
                }
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Notification history for the caller (GET /api/notifications)
pub async fn list_notifications(
    State(router): State<NotificationRouter>,
    AuthUser(caller): AuthUser,
) -> BackendResult<ApiResponse<Vec<Notification>>> {
    let list = router.list_for_user(caller.id, NOTIFICATION_HISTORY_LIMIT).await?;
    Ok(ApiResponse::ok("Notifications fetched", list))
}
