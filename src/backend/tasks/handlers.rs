//! HTTP handlers for tasks.

use axum::extract::State;
use uuid::Uuid;

use super::service::TaskService;
use crate::backend::error::BackendResult;
use crate::backend::extract::{ApiJson, ApiPath};
use crate::backend::middleware::AuthUser;
use crate::backend::response::ApiResponse;
use crate::shared::task::{NewTask, Task, TaskUpdate};

pub async fn list_tasks(
    State(tasks): State<TaskService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<Vec<Task>>> {
    let list = tasks.list_tasks(project_id, &caller).await?;
    Ok(ApiResponse::ok("Tasks fetched", list))
}

pub async fn add_task(
    State(tasks): State<TaskService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NewTask>,
) -> BackendResult<ApiResponse<Task>> {
    let task = tasks.add_task(project_id, &caller, body).await?;
    Ok(ApiResponse::created("Task added", task))
}

pub async fn get_task(
    State(tasks): State<TaskService>,
    AuthUser(caller): AuthUser,
    ApiPath((project_id, task_key)): ApiPath<(Uuid, String)>,
) -> BackendResult<ApiResponse<Task>> {
    let task = tasks.get_task(project_id, &caller, &task_key).await?;
    Ok(ApiResponse::ok("Task fetched", task))
}

pub async fn update_task(
    State(tasks): State<TaskService>,
    AuthUser(caller): AuthUser,
    ApiPath((project_id, task_key)): ApiPath<(Uuid, String)>,
    ApiJson(body): ApiJson<TaskUpdate>,
) -> BackendResult<ApiResponse<Task>> {
    let task = tasks.update_task(project_id, &caller, &task_key, body).await?;
    Ok(ApiResponse::ok("Task updated", task))
}
