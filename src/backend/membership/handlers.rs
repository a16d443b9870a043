//! HTTP handlers for project membership.
//!
//! - `GET    /api/projects/{project_id}/members`
//! - `POST   /api/projects/{project_id}/members`
//! - `PATCH  /api/projects/{project_id}/members/{user_id}`
//! - `DELETE /api/projects/{project_id}/members/{user_id}`
//! - `GET    /api/projects/{project_id}/invitation`
//! - `POST   /api/projects/{project_id}/invitation`

use axum::extract::State;
use uuid::Uuid;

use super::machine::{
    InvitationAction, InvitationPreview, InviteRequest, MemberSearch, MemberView,
    MembershipService, RespondRequest, RoleRequest,
};
use crate::backend::error::BackendResult;
use crate::backend::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middleware::AuthUser;
use crate::backend::response::ApiResponse;
use crate::shared::project::Member;

pub async fn list_members(
    State(membership): State<MembershipService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<MemberSearch>,
) -> BackendResult<ApiResponse<Vec<MemberView>>> {
    let members = membership
        .list_members(project_id, &caller, query.search.as_deref())
        .await?;
    Ok(ApiResponse::ok("Members fetched", members))
}

pub async fn invite_member(
    State(membership): State<MembershipService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<InviteRequest>,
) -> BackendResult<ApiResponse<Member>> {
    let member = membership
        .invite(project_id, &caller, &body.email, body.role)
        .await?;
    Ok(ApiResponse::created("Invitation sent", member))
}

pub async fn change_member_role(
    State(membership): State<MembershipService>,
    AuthUser(caller): AuthUser,
    ApiPath((project_id, user_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<RoleRequest>,
) -> BackendResult<ApiResponse<Member>> {
    let member = membership
        .change_role(project_id, &caller, user_id, body.role)
        .await?;
    Ok(ApiResponse::ok("Role updated", member))
}

pub async fn remove_member(
    State(membership): State<MembershipService>,
    AuthUser(caller): AuthUser,
    ApiPath((project_id, user_id)): ApiPath<(Uuid, Uuid)>,
) -> BackendResult<ApiResponse<Member>> {
    let member = membership.remove(project_id, &caller, user_id).await?;
    Ok(ApiResponse::ok("Member removed", member))
}

pub async fn get_invitation(
    State(membership): State<MembershipService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<InvitationPreview>> {
    let preview = membership.invitation_details(project_id, &caller).await?;
    Ok(ApiResponse::ok("Invitation fetched", preview))
}

pub async fn respond_to_invitation(
    State(membership): State<MembershipService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RespondRequest>,
) -> BackendResult<ApiResponse<Option<Member>>> {
    let member = membership.respond(project_id, &caller, body.action).await?;
    let message = match body.action {
        InvitationAction::Joined => "Invitation accepted",
        InvitationAction::Declined => "Invitation declined",
    };
    Ok(ApiResponse::ok(message, member))
}
