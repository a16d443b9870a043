/**
 * PostgreSQL Document Store
 *
 * Projects, threads, messages and tasks are stored as JSONB documents next to
 * the columns their queries filter on. Conditional updates run inside a
 * transaction holding `SELECT ... FOR UPDATE` on the one row they touch.
 *
 * # Tables
 *
 * See `migrations/0001_init.sql`. Thread uniqueness is the
 * `UNIQUE (project_id, member_key)` constraint; `counters` backs the atomic
 * increment with `INSERT ... ON CONFLICT DO UPDATE ... RETURNING`.
 */

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, PgPool};
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

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: String,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_picture: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_picture: row.profile_picture,
        }
    }
}

fn scope_parts(scope: &NotificationScope) -> (&'static str, Uuid) {
    match scope {
        NotificationScope::User(id) => ("USER", *id),
        NotificationScope::Project(id) => ("PROJECT", *id),
    }
}

/// The `seq` column is authoritative; the JSON copy is written before it exists
fn with_seq((seq, Json(mut message)): (i64, Json<ChatMessage>)) -> ChatMessage {
    message.seq = seq as u64;
    message
}

fn task_filter(lookup: &TaskLookup) -> (&'static str, String) {
    match lookup {
        TaskLookup::Key(key) => ("task_key = $2", key.clone()),
        TaskLookup::Id(id) => ("id::text = $2", id.to_string()),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert_user(&self, user: User) -> BackendResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, first_name, last_name, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_picture)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                BackendError::conflict("Email is already registered")
            }
            other => BackendError::Database(other),
        })?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> BackendResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, display_name, first_name, last_name, profile_picture FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn get_users(&self, ids: &[Uuid]) -> BackendResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, display_name, first_name, last_name, profile_picture FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_user_by_email(&self, email: &str) -> BackendResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, display_name, first_name, last_name, profile_picture FROM users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn insert_project(&self, project: Project) -> BackendResult<Project> {
        sqlx::query("INSERT INTO projects (id, doc, created_at, updated_at) VALUES ($1, $2, $3, $4)")
            .bind(project.id)
            .bind(Json(&project))
            .bind(project.created_at)
            .bind(project.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> BackendResult<Option<Project>> {
        let doc = sqlx::query_scalar::<_, Json<Project>>("SELECT doc FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc.map(|Json(p)| p))
    }

    async fn list_projects_for_member(&self, user: Uuid) -> BackendResult<Vec<Project>> {
        let docs = sqlx::query_scalar::<_, Json<Project>>(
            r#"
            SELECT doc FROM projects
            WHERE doc->>'status' = 'ACTIVE'
              AND doc->'members' @> jsonb_build_array(jsonb_build_object('user', $1::text, 'status', 'JOINED'))
            ORDER BY created_at DESC
            "#,
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(docs.into_iter().map(|Json(p)| p).collect())
    }

    async fn modify_project(&self, id: Uuid, mutation: ProjectMutation) -> BackendResult<Project> {
        let mut tx = self.pool.begin().await?;

        let Json(mut project) = sqlx::query_scalar::<_, Json<Project>>(
            "SELECT doc FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| BackendError::not_found("Project not found"))?;

        // Dropping `tx` on error rolls back and releases the row lock
        mutation(&mut project)?;
        project.updated_at = Utc::now();

        sqlx::query("UPDATE projects SET doc = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(Json(&project))
            .bind(project.updated_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn insert_notification(&self, notification: Notification) -> BackendResult<()> {
        let (scope, target) = scope_parts(&notification.scope);
        sqlx::query(
            "INSERT INTO notifications (id, scope, target, doc, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(notification.id)
        .bind(scope)
        .bind(target)
        .bind(Json(&notification))
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        scopes: &[NotificationScope],
        limit: usize,
    ) -> BackendResult<Vec<Notification>> {
        let (kinds, targets): (Vec<&str>, Vec<Uuid>) = scopes.iter().map(scope_parts).unzip();
        let docs = sqlx::query_scalar::<_, Json<Notification>>(
            r#"
            SELECT n.doc FROM notifications n
            JOIN UNNEST($1::text[], $2::uuid[]) AS s(scope, target)
              ON n.scope = s.scope AND n.target = s.target
            ORDER BY n.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(kinds)
        .bind(targets)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs.into_iter().map(|Json(n)| n).collect())
    }

    async fn create_thread_if_absent(&self, thread: ChatThread) -> BackendResult<(ChatThread, bool)> {
        let member_key = thread.member_key();
        let inserted = sqlx::query_scalar::<_, Json<ChatThread>>(
            r#"
            INSERT INTO chat_threads (id, project_id, member_key, doc, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (project_id, member_key) DO NOTHING
            RETURNING doc
            "#,
        )
        .bind(thread.id)
        .bind(thread.project)
        .bind(&member_key)
        .bind(Json(&thread))
        .bind(thread.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(Json(created)) = inserted {
            return Ok((created, true));
        }

        let Json(existing) = sqlx::query_scalar::<_, Json<ChatThread>>(
            "SELECT doc FROM chat_threads WHERE project_id = $1 AND member_key = $2",
        )
        .bind(thread.project)
        .bind(&member_key)
        .fetch_one(&self.pool)
        .await?;
        Ok((existing, false))
    }

    async fn get_thread(&self, id: Uuid) -> BackendResult<Option<ChatThread>> {
        let doc = sqlx::query_scalar::<_, Json<ChatThread>>("SELECT doc FROM chat_threads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc.map(|Json(t)| t))
    }

    async fn list_threads_for_member(&self, project: Uuid, user: Uuid) -> BackendResult<Vec<ChatThread>> {
        let docs = sqlx::query_scalar::<_, Json<ChatThread>>(
            r#"
            SELECT doc FROM chat_threads
            WHERE project_id = $1 AND doc->'members' @> jsonb_build_array($2::text)
            ORDER BY created_at DESC
            "#,
        )
        .bind(project)
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(docs.into_iter().map(|Json(t)| t).collect())
    }

    async fn set_thread_last_message(&self, thread: Uuid, message: Uuid) -> BackendResult<()> {
        let result = sqlx::query(
            "UPDATE chat_threads SET doc = jsonb_set(doc, '{last_message}', to_jsonb($2::text)) WHERE id = $1",
        )
        .bind(thread)
        .bind(message.to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(BackendError::not_found("Chat not found"));
        }
        Ok(())
    }

    async fn append_message(&self, mut message: ChatMessage) -> BackendResult<ChatMessage> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO chat_messages (id, project_id, chat_id, doc, sent_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING seq
            "#,
        )
        .bind(message.id)
        .bind(message.project)
        .bind(message.chat_id)
        .bind(Json(&message))
        .bind(message.sent_at)
        .fetch_one(&self.pool)
        .await?;
        message.seq = seq as u64;
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> BackendResult<Option<ChatMessage>> {
        let row = sqlx::query_as::<_, (i64, Json<ChatMessage>)>(
            "SELECT seq, doc FROM chat_messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(with_seq))
    }

    async fn list_project_messages(
        &self,
        project: Uuid,
        limit: usize,
        skip: usize,
    ) -> BackendResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, (i64, Json<ChatMessage>)>(
            r#"
            SELECT seq, doc FROM chat_messages
            WHERE project_id = $1 AND chat_id IS NULL
            ORDER BY sent_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(project)
        .bind(limit as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(with_seq).collect())
    }

    async fn list_thread_messages(&self, thread: Uuid) -> BackendResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, (i64, Json<ChatMessage>)>(
            "SELECT seq, doc FROM chat_messages WHERE chat_id = $1 ORDER BY sent_at ASC, seq ASC",
        )
        .bind(thread)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(with_seq).collect())
    }

    async fn mark_message_read(&self, id: Uuid, user: Uuid) -> BackendResult<ChatMessage> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, (i64, Json<ChatMessage>)>(
            "SELECT seq, doc FROM chat_messages WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| BackendError::not_found("Message not found"))?;

        let mut message = with_seq(row);
        if message.mark_read_by(user) {
            sqlx::query("UPDATE chat_messages SET doc = $2 WHERE id = $1")
                .bind(id)
                .bind(Json(&message))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(message)
    }

    async fn increment_counter(&self, name: &str) -> BackendResult<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO counters (name, value) VALUES ($1, 1)
            ON CONFLICT (name) DO UPDATE SET value = counters.value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }

    async fn insert_task(&self, task: Task) -> BackendResult<Task> {
        sqlx::query(
            "INSERT INTO tasks (id, project_id, task_key, doc, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(task.id)
        .bind(task.project)
        .bind(&task.task_key)
        .bind(Json(&task))
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                BackendError::conflict("Task key already exists")
            }
            other => BackendError::Database(other),
        })?;
        Ok(task)
    }

    async fn get_task(&self, project: Uuid, lookup: &TaskLookup) -> BackendResult<Option<Task>> {
        let (filter, value) = task_filter(lookup);
        let sql = format!("SELECT doc FROM tasks WHERE project_id = $1 AND {}", filter);
        let doc = sqlx::query_scalar::<_, Json<Task>>(&sql)
            .bind(project)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc.map(|Json(t)| t))
    }

    async fn list_tasks(&self, project: Uuid) -> BackendResult<Vec<Task>> {
        let docs = sqlx::query_scalar::<_, Json<Task>>(
            "SELECT doc FROM tasks WHERE project_id = $1 ORDER BY created_at ASC",
        )
        .bind(project)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs.into_iter().map(|Json(t)| t).collect())
    }

    async fn update_task(
        &self,
        project: Uuid,
        lookup: &TaskLookup,
        update: TaskUpdate,
    ) -> BackendResult<Task> {
        let (filter, value) = task_filter(lookup);
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT doc FROM tasks WHERE project_id = $1 AND {} FOR UPDATE",
            filter
        );
        let Json(mut task) = sqlx::query_scalar::<_, Json<Task>>(&sql)
            .bind(project)
            .bind(value)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BackendError::not_found("Task not found"))?;

        task.apply(&update)?;

        sqlx::query("UPDATE tasks SET doc = $2 WHERE id = $1")
            .bind(task.id)
            .bind(Json(&task))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(task)
    }
}
