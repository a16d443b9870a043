//! Project CRUD and the access checks every other workflow shares.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cache::ProjectCache;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::ConnectionDirectory;
use crate::backend::store::DocumentStore;
use crate::shared::{
    error::require_text,
    project::{Member, MemberRole, Project, ProjectStatus, ProjectType},
    user::Caller,
};

/// Joined member entry for `user`, or Forbidden
pub fn require_joined(project: &Project, user: Uuid) -> BackendResult<&Member> {
    project
        .joined_member(user)
        .ok_or_else(|| BackendError::forbidden("You are not a member of this project"))
}

/// Joined OWNER/ADMIN entry for `user`, or Forbidden
pub fn require_manager(project: &Project, user: Uuid) -> BackendResult<&Member> {
    let member = require_joined(project, user)?;
    if !member.role.can_manage_members() {
        return Err(BackendError::forbidden(
            "Only project owners and admins can do this",
        ));
    }
    Ok(member)
}

/// Load an active project or fail with NotFound
pub async fn load_active(store: &dyn DocumentStore, id: Uuid) -> BackendResult<Project> {
    store
        .get_project(id)
        .await?
        .filter(|p| p.is_active())
        .ok_or_else(|| BackendError::not_found("Project not found"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub project_type: ProjectType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<ProjectType>,
    pub chat_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectSearch {
    pub search: Option<String>,
}

/// Listing entry
#[derive(Debug, Clone, Serialize)]
pub struct ProjectListing {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub role: MemberRole,
    pub member_count: usize,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn DocumentStore>,
    cache: ProjectCache,
    directory: Arc<ConnectionDirectory>,
}

impl ProjectService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: ProjectCache,
        directory: Arc<ConnectionDirectory>,
    ) -> Self {
        Self {
            store,
            cache,
            directory,
        }
    }

    pub async fn create(&self, caller: &Caller, request: NewProject) -> BackendResult<Project> {
        let project = Project::new(
            caller.id,
            &request.name,
            request.description,
            request.project_type,
        )?;
        let project = self.store.insert_project(project).await?;
        self.cache.put(project.summary());

        // Already-open connections of the creator start receiving room events
        for handle in self.directory.resolve(caller.id) {
            self.directory.join_room(project.id, &handle);
        }
        tracing::info!("[Projects] {} created {} ({})", caller.id, project.id, project.key);
        Ok(project)
    }

    pub async fn list_for_user(
        &self,
        caller: &Caller,
        search: Option<&str>,
    ) -> BackendResult<Vec<ProjectListing>> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let projects = self.store.list_projects_for_member(caller.id).await?;
        Ok(projects
            .into_iter()
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n),
                None => true,
            })
            .filter_map(|p| {
                let role = p.joined_member(caller.id)?.role;
                Some(ProjectListing {
                    id: p.id,
                    name: p.name.clone(),
                    key: p.key.clone(),
                    project_type: p.project_type,
                    role,
                    member_count: p.members.len(),
                })
            })
            .collect())
    }

    /// Project document for a joined member
    pub async fn details(&self, id: Uuid, caller: &Caller) -> BackendResult<Project> {
        let project = load_active(self.store.as_ref(), id).await?;
        require_joined(&project, caller.id)?;
        Ok(project)
    }

    /// Name, description, type and chat flag; the key never changes
    pub async fn update(
        &self,
        id: Uuid,
        caller: &Caller,
        update: ProjectUpdate,
    ) -> BackendResult<Project> {
        let actor = caller.id;
        let project = self
            .store
            .modify_project(
                id,
                Box::new(move |project: &mut Project| {
                    if !project.is_active() {
                        return Err(BackendError::not_found("Project not found"));
                    }
                    require_manager(project, actor)?;
                    if let Some(name) = &update.name {
                        project.name = require_text("name", name)?;
                    }
                    if let Some(description) = update.description {
                        project.description = Some(description);
                    }
                    if let Some(project_type) = update.project_type {
                        project.project_type = project_type;
                    }
                    if let Some(chat_enabled) = update.chat_enabled {
                        project.chat_enabled = chat_enabled;
                    }
                    Ok(())
                }),
            )
            .await?;
        self.cache.invalidate(id);
        Ok(project)
    }

    /// Soft delete; owners only
    pub async fn delete(&self, id: Uuid, caller: &Caller) -> BackendResult<Project> {
        let actor = caller.id;
        let project = self
            .store
            .modify_project(
                id,
                Box::new(move |project: &mut Project| {
                    if !project.is_active() {
                        return Err(BackendError::not_found("Project not found"));
                    }
                    let member = require_joined(project, actor)?;
                    if member.role != MemberRole::Owner {
                        return Err(BackendError::forbidden("Only project owners can delete a project"));
                    }
                    project.status = ProjectStatus::Deleted;
                    Ok(())
                }),
            )
            .await?;
        self.cache.invalidate(id);
        tracing::info!("[Projects] {} deleted {}", actor, id);
        Ok(project)
    }
}
