//! HTTP handlers for projects.

use axum::extract::State;
use uuid::Uuid;

use super::service::{NewProject, ProjectListing, ProjectSearch, ProjectService, ProjectUpdate};
use crate::backend::error::BackendResult;
use crate::backend::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middleware::AuthUser;
use crate::backend::response::ApiResponse;
use crate::shared::project::Project;

pub async fn list_projects(
    State(projects): State<ProjectService>,
    AuthUser(caller): AuthUser,
    ApiQuery(query): ApiQuery<ProjectSearch>,
) -> BackendResult<ApiResponse<Vec<ProjectListing>>> {
    let list = projects.list_for_user(&caller, query.search.as_deref()).await?;
    Ok(ApiResponse::ok("Projects fetched", list))
}

pub async fn create_project(
    State(projects): State<ProjectService>,
    AuthUser(caller): AuthUser,
    ApiJson(body): ApiJson<NewProject>,
) -> BackendResult<ApiResponse<Project>> {
    let project = projects.create(&caller, body).await?;
    Ok(ApiResponse::created("Project created", project))
}

pub async fn get_project(
    State(projects): State<ProjectService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<Project>> {
    let project = projects.details(project_id, &caller).await?;
    Ok(ApiResponse::ok("Project fetched", project))
}

pub async fn update_project(
    State(projects): State<ProjectService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ProjectUpdate>,
) -> BackendResult<ApiResponse<Project>> {
    let project = projects.update(project_id, &caller, body).await?;
    Ok(ApiResponse::ok("Project updated", project))
}

pub async fn delete_project(
    State(projects): State<ProjectService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<Project>> {
    let project = projects.delete(project_id, &caller).await?;
    Ok(ApiResponse::ok("Project deleted", project))
}
