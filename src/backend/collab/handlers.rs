//! HTTP handlers for collab sessions.
//!
//! - `POST   /api/projects/{project_id}/collab` - start, or join with `?collabId=`
//! - `DELETE /api/collab/{collab_id}` - leave
//! - `POST   /api/projects/{project_id}/collab/{collab_id}/invite`

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use super::state::{LeaveOutcome, SessionView};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middleware::AuthUser;
use crate::backend::projects::{load_active, require_joined};
use crate::backend::realtime::DeliveryOutcome;
use crate::backend::response::ApiResponse;
use crate::backend::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CollabQuery {
    #[serde(rename = "collabId")]
    pub collab_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CollabInviteRequest {
    #[serde(default)]
    pub invitees: Vec<Uuid>,
}

pub async fn start_or_join_session(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<CollabQuery>,
) -> BackendResult<ApiResponse<SessionView>> {
    let project = load_active(state.store.as_ref(), project_id).await?;
    require_joined(&project, caller.id)?;

    match query.collab_id {
        Some(id) => {
            let existing = state.sessions.get(id).filter(|s| s.project == project_id);
            if existing.is_none() {
                return Err(BackendError::not_found("Collab session not found"));
            }
            let view = state.sessions.join(id, &caller)?;
            Ok(ApiResponse::ok("Joined session", view))
        }
        None => {
            let view = state.sessions.create(project_id, &caller);
            Ok(ApiResponse::created("Session started", view))
        }
    }
}

pub async fn leave_session(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(collab_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<LeaveOutcome>> {
    let outcome = state.sessions.leave(collab_id, caller.id)?;
    let message = if outcome.destroyed { "Session ended" } else { "Left session" };
    Ok(ApiResponse::ok(message, outcome))
}

pub async fn invite_to_session(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath((project_id, collab_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<CollabInviteRequest>,
) -> BackendResult<ApiResponse<Vec<DeliveryOutcome>>> {
    let project = load_active(state.store.as_ref(), project_id).await?;
    require_joined(&project, caller.id)?;

    let outcomes = state
        .sessions
        .invite(collab_id, project_id, &caller, &body.invitees)
        .await?;
    Ok(ApiResponse::ok("Invitations sent", outcomes))
}
