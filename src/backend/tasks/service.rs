//! Task CRUD on top of the key allocator.

use std::sync::Arc;

use uuid::Uuid;

use super::allocator::TaskKeyAllocator;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::projects::{load_active, require_joined};
use crate::backend::store::{DocumentStore, TaskLookup};
use crate::shared::{
    project::{MemberRole, Project},
    task::{NewTask, Task, TaskType, TaskUpdate},
    user::Caller,
};

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn DocumentStore>,
    allocator: TaskKeyAllocator,
}

impl TaskService {
    pub fn new(store: Arc<dyn DocumentStore>, allocator: TaskKeyAllocator) -> Self {
        Self { store, allocator }
    }

    /// Joined member with write access
    async fn require_writer(&self, project_id: Uuid, caller: &Caller) -> BackendResult<Project> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        if require_joined(&project, caller.id)?.role == MemberRole::Read {
            return Err(BackendError::forbidden("You have read-only access to this project"));
        }
        Ok(project)
    }

    /// Main tasks consume the next key; sub-tasks take none and need an
    /// existing main-task parent in the same project.
    pub async fn add_task(&self, project_id: Uuid, caller: &Caller, request: NewTask) -> BackendResult<Task> {
        let project = self.require_writer(project_id, caller).await?;
        if let Some(assignee) = request.assignee {
            if project.joined_member(assignee).is_none() {
                return Err(BackendError::validation("assignee", "Assignee must be a project member"));
            }
        }

        let task_key = match request.task_type {
            TaskType::MainTask => Some(self.allocator.next_task_key(project_id, &project.key).await?),
            TaskType::SubTask => {
                let parent_id = request
                    .parent
                    .ok_or_else(|| BackendError::validation("parent", "A sub-task needs a parent task"))?;
                let parent = self
                    .store
                    .get_task(project_id, &TaskLookup::Id(parent_id))
                    .await?
                    .ok_or_else(|| BackendError::not_found("Parent task not found"))?;
                if parent.is_sub_task() {
                    return Err(BackendError::validation("parent", "Sub-tasks cannot have sub-tasks"));
                }
                None
            }
        };

        let task = request.into_task(project_id, caller.id, task_key)?;
        let task = self.store.insert_task(task).await?;
        tracing::info!(
            "[Tasks] {} added {} in {}",
            caller.id,
            task.task_key.as_deref().unwrap_or("sub-task"),
            project_id
        );
        Ok(task)
    }

    pub async fn list_tasks(&self, project_id: Uuid, caller: &Caller) -> BackendResult<Vec<Task>> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        require_joined(&project, caller.id)?;
        self.store.list_tasks(project_id).await
    }

    pub async fn get_task(&self, project_id: Uuid, caller: &Caller, key: &str) -> BackendResult<Task> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        require_joined(&project, caller.id)?;
        self.store
            .get_task(project_id, &TaskLookup::parse(key))
            .await?
            .ok_or_else(|| BackendError::not_found("Task not found"))
    }

    pub async fn update_task(
        &self,
        project_id: Uuid,
        caller: &Caller,
        key: &str,
        update: TaskUpdate,
    ) -> BackendResult<Task> {
        self.require_writer(project_id, caller).await?;
        self.store
            .update_task(project_id, &TaskLookup::parse(key), update)
            .await
    }
}
