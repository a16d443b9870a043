//! Task records.
//!
//! Top-level tasks carry a `{PROJECT_KEY}-{n}` key minted from a durable counter;
//! sub-tasks hang off a parent and are not numbered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::{require_text, SharedError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    #[default]
    MainTask,
    SubTask,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub project: Uuid,
    #[serde(default)]
    pub task_key: Option<String>,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub parent: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub reporter: Uuid,
    #[serde(default)]
    pub assignee: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_sub_task(&self) -> bool {
        self.task_type == TaskType::SubTask
    }

    /// Apply a partial update; the key, type and parent never change
    pub fn apply(&mut self, update: &TaskUpdate) -> Result<(), SharedError> {
        if let Some(title) = &update.title {
            self.title = require_text("title", title)?;
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(assignee) = update.assignee {
            self.assignee = Some(assignee);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Request body for adding a task
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub assignee: Option<Uuid>,
}

impl NewTask {
    /// Build the task record; `task_key` is supplied by the allocator for main tasks
    pub fn into_task(
        self,
        project: Uuid,
        reporter: Uuid,
        task_key: Option<String>,
    ) -> Result<Task, SharedError> {
        let title = require_text("title", &self.title)?;
        if self.task_type == TaskType::SubTask && self.parent.is_none() {
            return Err(SharedError::validation(
                "parent",
                "A sub-task needs a parent task",
            ));
        }
        let now = Utc::now();
        Ok(Task {
            id: Uuid::new_v4(),
            project,
            task_key,
            task_type: self.task_type,
            parent: if self.task_type == TaskType::SubTask { self.parent } else { None },
            title,
            description: self.description,
            status: TaskStatus::Todo,
            reporter,
            assignee: self.assignee,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update body
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assignee: Option<Uuid>,
}
