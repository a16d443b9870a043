//! Project lookup cache.
//!
//! Supplies `{project id -> {name, key}}` to code that needs project metadata
//! for payloads and task keys without another store round-trip. Filled on
//! miss, invalidated whenever a project is updated or deleted.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::DocumentStore;
use crate::shared::project::ProjectSummary;

#[derive(Clone)]
pub struct ProjectCache {
    entries: Arc<DashMap<Uuid, ProjectSummary>>,
    store: Arc<dyn DocumentStore>,
}

impl ProjectCache {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            store,
        }
    }

    pub async fn get(&self, project: Uuid) -> BackendResult<ProjectSummary> {
        if let Some(hit) = self.entries.get(&project) {
            return Ok(hit.clone());
        }

        let summary = self
            .store
            .get_project(project)
            .await?
            .filter(|p| p.is_active())
            .map(|p| p.summary())
            .ok_or_else(|| BackendError::not_found("Project not found"))?;
        self.entries.insert(project, summary.clone());
        Ok(summary)
    }

    pub fn put(&self, summary: ProjectSummary) {
        self.entries.insert(summary.id, summary);
    }

    pub fn invalidate(&self, project: Uuid) {
        self.entries.remove(&project);
    }

    pub fn contains(&self, project: Uuid) -> bool {
        self.entries.contains_key(&project)
    }
}
