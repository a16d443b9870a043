/**
 * API Routes
 *
 * Every route here requires authentication; `create_router` applies the auth
 * middleware as a route layer over all of them.
 *
 * # Routes
 *
 * ## Projects
 * - `GET|POST /api/projects`
 * - `GET|PUT|DELETE /api/projects/{project_id}`
 *
 * ## Membership
 * - `GET|POST /api/projects/{project_id}/members` - list / invite
 * - `PATCH|DELETE /api/projects/{project_id}/members/{user_id}` - role / remove
 * - `GET|POST /api/projects/{project_id}/invitation` - preview / respond
 *
 * ## Chat
 * - `GET|POST /api/projects/{project_id}/chats` - project room
 * - `GET|POST /api/projects/{project_id}/personal-chats` - threads / resolve
 * - `GET|POST /api/projects/{project_id}/personal-chats/{chat_id}`
 * - `PATCH /api/messages/{message_id}/read`
 *
 * ## Collab
 * - `POST /api/projects/{project_id}/collab[?collabId=]`
 * - `DELETE /api/collab/{collab_id}`
 * - `POST /api/projects/{project_id}/collab/{collab_id}/invite`
 *
 * ## Tasks
 * - `GET|POST /api/projects/{project_id}/tasks`
 * - `GET|PATCH /api/projects/{project_id}/tasks/{task_key}`
 *
 * ## Notifications
 * - `GET /api/notifications`
 */

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::backend::chat::handlers as chat;
use crate::backend::collab::handlers as collab;
use crate::backend::membership::handlers as membership;
use crate::backend::projects::handlers as projects;
use crate::backend::realtime::list_notifications;
use crate::backend::server::state::AppState;
use crate::backend::tasks::handlers as tasks;

pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Projects
        .route("/api/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/api/projects/{project_id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        // Membership
        .route(
            "/api/projects/{project_id}/members",
            get(membership::list_members).post(membership::invite_member),
        )
        .route(
            "/api/projects/{project_id}/members/{user_id}",
            patch(membership::change_member_role).delete(membership::remove_member),
        )
        .route(
            "/api/projects/{project_id}/invitation",
            get(membership::get_invitation).post(membership::respond_to_invitation),
        )
        // Chat
        .route(
            "/api/projects/{project_id}/chats",
            get(chat::list_project_messages).post(chat::post_project_message),
        )
        .route(
            "/api/projects/{project_id}/personal-chats",
            get(chat::list_threads).post(chat::resolve_thread),
        )
        .route(
            "/api/projects/{project_id}/personal-chats/{chat_id}",
            get(chat::list_thread_messages).post(chat::post_thread_message),
        )
        .route("/api/messages/{message_id}/read", patch(chat::mark_message_read))
        // Collab
        .route("/api/projects/{project_id}/collab", post(collab::start_or_join_session))
        .route("/api/collab/{collab_id}", delete(collab::leave_session))
        .route(
            "/api/projects/{project_id}/collab/{collab_id}/invite",
            post(collab::invite_to_session),
        )
        // Tasks
        .route(
            "/api/projects/{project_id}/tasks",
            get(tasks::list_tasks).post(tasks::add_task),
        )
        .route(
            "/api/projects/{project_id}/tasks/{task_key}",
            get(tasks::get_task).patch(tasks::update_task),
        )
        // Notifications
        .route("/api/notifications", get(list_notifications))
}
