//! HTTP handlers for project and direct chat.
//!
//! - `GET/POST /api/projects/{project_id}/chats`
//! - `GET/POST /api/projects/{project_id}/personal-chats`
//! - `GET/POST /api/projects/{project_id}/personal-chats/{chat_id}`
//! - `PATCH    /api/messages/{message_id}/read`

use axum::extract::State;
use uuid::Uuid;

use super::resolver::{ChatService, ResolvedThread};
use crate::backend::error::BackendResult;
use crate::backend::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middleware::AuthUser;
use crate::backend::response::ApiResponse;
use crate::shared::messaging::{
    ChatMessage, ChatThread, CreateThreadRequest, PageQuery, SendMessageRequest,
};

pub async fn list_project_messages(
    State(chat): State<ChatService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> BackendResult<ApiResponse<Vec<ChatMessage>>> {
    let messages = chat.list_project_messages(project_id, &caller, page).await?;
    Ok(ApiResponse::ok("Messages fetched", messages))
}

pub async fn post_project_message(
    State(chat): State<ChatService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> BackendResult<ApiResponse<ChatMessage>> {
    let message = chat
        .post_project_message(project_id, &caller, body.body()?)
        .await?;
    Ok(ApiResponse::created("Message sent", message))
}

pub async fn list_threads(
    State(chat): State<ChatService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<Vec<ChatThread>>> {
    let threads = chat.list_threads(project_id, &caller).await?;
    Ok(ApiResponse::ok("Chats fetched", threads))
}

pub async fn resolve_thread(
    State(chat): State<ChatService>,
    AuthUser(caller): AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateThreadRequest>,
) -> BackendResult<ApiResponse<ResolvedThread>> {
    let resolved = chat
        .resolve_or_create_thread(project_id, &caller, body.receiver)
        .await?;
    if resolved.created {
        Ok(ApiResponse::created("Chat created", resolved))
    } else {
        Ok(ApiResponse::ok("Chat found", resolved))
    }
}

pub async fn list_thread_messages(
    State(chat): State<ChatService>,
    AuthUser(caller): AuthUser,
    ApiPath((project_id, chat_id)): ApiPath<(Uuid, Uuid)>,
) -> BackendResult<ApiResponse<Vec<ChatMessage>>> {
    let messages = chat.list_thread_messages(project_id, chat_id, &caller).await?;
    Ok(ApiResponse::ok("Messages fetched", messages))
}

pub async fn post_thread_message(
    State(chat): State<ChatService>,
    AuthUser(caller): AuthUser,
    ApiPath((project_id, chat_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> BackendResult<ApiResponse<ChatMessage>> {
    let message = chat
        .post_message(project_id, chat_id, &caller, body.receiver.clone(), body.body()?)
        .await?;
    Ok(ApiResponse::created("Message sent", message))
}

pub async fn mark_message_read(
    State(chat): State<ChatService>,
    AuthUser(caller): AuthUser,
    ApiPath(message_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<ChatMessage>> {
    let message = chat.mark_read(message_id, &caller).await?;
    Ok(ApiResponse::ok("Message marked as read", message))
}
