//! Task key allocation.
//!
//! Keys are `{PROJECT_KEY}-{n}` where `n` comes from one atomic store
//! increment, so concurrent callers always get distinct values with no gaps.
//! The counter is per project unless configured as one global sequence.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::store::DocumentStore;
use crate::shared::config::AppConfig;

#[derive(Clone)]
pub struct TaskKeyAllocator {
    store: Arc<dyn DocumentStore>,
    config: Arc<AppConfig>,
}

impl TaskKeyAllocator {
    pub fn new(store: Arc<dyn DocumentStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub async fn next_task_key(&self, project_id: Uuid, project_key: &str) -> BackendResult<String> {
        let counter = self.config.task_counter_name(project_id);
        let n = self.store.increment_counter(&counter).await?;
        Ok(format!("{}-{}", project_key, n))
    }
}
