/**
 * Membership State Machine
 *
 * ```text
 *            invite                respond(JOINED)
 *   (none) ---------> PENDING ----------------------> JOINED
 *                        |                              |
 *                        | respond(DECLINED) / remove   | remove
 *                        v                              v
 *                     (none)                          (none)
 * ```
 *
 * Every check and the transition it guards run inside one `modify_project`
 * call, so two concurrent responses to the same invitation cannot both pass
 * the PENDING check. The durable write always completes before the dependent
 * notification is sent.
 *
 * `change_role` and `remove` refuse any transition that would leave the
 * project without a joined OWNER.
 */

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::mail::{Mailer, OutboundEmail};
use crate::backend::projects::{load_active, require_joined, require_manager};
use crate::backend::realtime::{ConnectionDirectory, NotificationRouter};
use crate::backend::store::DocumentStore;
use crate::shared::{
    config::AppConfig,
    error::require_text,
    notification::NotificationPayload,
    project::{Member, MemberRole, MemberStatus, Project, ProjectSummary},
    user::{Caller, UserProfile},
    LiveEvent,
};

/// Answer to a pending invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationAction {
    Joined,
    #[serde(alias = "declined")]
    Declined,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<MemberRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RespondRequest {
    pub action: InvitationAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub role: MemberRole,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberSearch {
    pub search: Option<String>,
}

/// Member entry joined with the user's public profile
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub user: UserProfile,
    pub email: String,
    pub role: MemberRole,
    pub status: MemberStatus,
}

/// What an invitee sees before answering
#[derive(Debug, Clone, Serialize)]
pub struct InvitationPreview {
    pub project: ProjectSummary,
    pub description: Option<String>,
    pub role: MemberRole,
    pub members: Vec<UserProfile>,
}

#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn DocumentStore>,
    router: NotificationRouter,
    directory: Arc<ConnectionDirectory>,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
}

impl MembershipService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        router: NotificationRouter,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        let directory = router.directory().clone();
        Self {
            store,
            router,
            directory,
            mailer,
            config,
        }
    }

    /// Invite the user owning `email` as a PENDING member.
    ///
    /// Conflict if the user already has any entry in the project. A failed
    /// invitation email fails the request even though the entry was written.
    pub async fn invite(
        &self,
        project_id: Uuid,
        inviter: &Caller,
        email: &str,
        role: Option<MemberRole>,
    ) -> BackendResult<Member> {
        let email = require_text("email", email)?.to_lowercase();
        let role = role.unwrap_or_default();

        let project = load_active(self.store.as_ref(), project_id).await?;
        require_manager(&project, inviter.id)?;

        let invitee = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("No user found with email {}", email)))?;

        let inviter_id = inviter.id;
        let invitee_id = invitee.id;
        let project = self
            .store
            .modify_project(
                project_id,
                Box::new(move |project: &mut Project| {
                    if !project.is_active() {
                        return Err(BackendError::not_found("Project not found"));
                    }
                    require_manager(project, inviter_id)?;
                    if project.member(invitee_id).is_some() {
                        return Err(BackendError::conflict(
                            "User is already a member of this project",
                        ));
                    }
                    project.members.push(Member::pending(invitee_id, role));
                    Ok(())
                }),
            )
            .await?;
        tracing::info!("[Membership] {} invited {} to {} as {}", inviter.id, invitee.id, project.id, role);

        let redirect = format!(
            "/{}/{}/invitations",
            utf8_percent_encode(&inviter.display_name, NON_ALPHANUMERIC),
            project.id
        );
        let email = OutboundEmail::invitation(
            &invitee.email,
            &inviter.display_name,
            &project.name,
            role.as_str(),
            &format!("{}{}", self.config.public_origin, redirect),
        );
        self.mailer.send(email).await?;

        let payload = NotificationPayload::actionable(
            format!("{} invited you to join {}", inviter.display_name, project.name),
            redirect,
        )
        .with_action_title(format!("{} - {}", project.name, role))
        .with_initiator(inviter.display_name.clone(), inviter.profile_picture.clone());
        self.router
            .notify_user(invitee.id, LiveEvent::NewNotification, payload)
            .await?;

        Ok(Member::pending(invitee.id, role))
    }

    /// Accept or decline a pending invitation. Exactly one response succeeds.
    ///
    /// Returns the updated entry on JOINED, `None` on DECLINED.
    pub async fn respond(
        &self,
        project_id: Uuid,
        caller: &Caller,
        action: InvitationAction,
    ) -> BackendResult<Option<Member>> {
        let user = caller.id;
        let project = self
            .store
            .modify_project(
                project_id,
                Box::new(move |project: &mut Project| {
                    if !project.is_active() {
                        return Err(BackendError::not_found("Project not found"));
                    }
                    let member = project.member_mut(user).ok_or_else(|| {
                        BackendError::forbidden("You have not been invited to this project")
                    })?;
                    if member.status != MemberStatus::Pending {
                        return Err(BackendError::conflict(
                            "This invitation has already been answered",
                        ));
                    }
                    match action {
                        InvitationAction::Joined => member.status = MemberStatus::Joined,
                        InvitationAction::Declined => {
                            project.remove_member(user);
                        }
                    }
                    Ok(())
                }),
            )
            .await?;

        match action {
            InvitationAction::Declined => {
                tracing::info!("[Membership] {} declined {}", caller.id, project_id);
                Ok(None)
            }
            InvitationAction::Joined => {
                tracing::info!("[Membership] {} joined {}", caller.id, project_id);
                for handle in self.directory.resolve(caller.id) {
                    self.directory.join_room(project_id, &handle);
                }

                let payload = NotificationPayload::informational(format!(
                    "{} has now joined",
                    caller.display_name
                ))
                .with_redirect(format!("/project/{}", project_id))
                .with_initiator(caller.display_name.clone(), caller.profile_picture.clone());
                self.router
                    .notify_project(project_id, LiveEvent::NewNotification, payload, caller.id)
                    .await?;

                Ok(project.member(caller.id).cloned())
            }
        }
    }

    /// Overwrite a member's role
    pub async fn change_role(
        &self,
        project_id: Uuid,
        actor: &Caller,
        target: Uuid,
        role: MemberRole,
    ) -> BackendResult<Member> {
        let actor_id = actor.id;
        let project = self
            .store
            .modify_project(
                project_id,
                Box::new(move |project: &mut Project| {
                    if !project.is_active() {
                        return Err(BackendError::not_found("Project not found"));
                    }
                    require_manager(project, actor_id)?;
                    let member = project
                        .member_mut(target)
                        .ok_or_else(|| BackendError::not_found("Member not found"))?;
                    member.role = role;
                    if !project.has_owner() {
                        return Err(BackendError::conflict(
                            "A project must keep at least one owner",
                        ));
                    }
                    Ok(())
                }),
            )
            .await?;

        let name = self
            .store
            .get_user(target)
            .await?
            .map(|u| u.display_name)
            .unwrap_or_else(|| "A member".to_string());
        let payload = NotificationPayload::informational(format!("{} now has {} access.", name, role))
            .with_initiator(actor.display_name.clone(), actor.profile_picture.clone());
        self.router
            .notify_project(project_id, LiveEvent::NewNotification, payload, actor.id)
            .await?;

        project
            .member(target)
            .cloned()
            .ok_or_else(|| BackendError::state("Member vanished after role change"))
    }

    /// Delete a member entry. Managers may remove anyone; members may remove
    /// themselves (leave). No notification is sent.
    pub async fn remove(&self, project_id: Uuid, actor: &Caller, target: Uuid) -> BackendResult<Member> {
        let actor_id = actor.id;
        let before = load_active(self.store.as_ref(), project_id).await?;
        let removed = before
            .member(target)
            .cloned()
            .ok_or_else(|| BackendError::not_found("Member not found"))?;

        self.store
            .modify_project(
                project_id,
                Box::new(move |project: &mut Project| {
                    if !project.is_active() {
                        return Err(BackendError::not_found("Project not found"));
                    }
                    if actor_id != target {
                        require_manager(project, actor_id)?;
                    }
                    project
                        .remove_member(target)
                        .ok_or_else(|| BackendError::not_found("Member not found"))?;
                    if !project.has_owner() {
                        return Err(BackendError::conflict(
                            "A project must keep at least one owner",
                        ));
                    }
                    Ok(())
                }),
            )
            .await?;

        for handle in self.directory.resolve(target) {
            self.directory.leave_room(project_id, handle.id);
        }
        tracing::info!("[Membership] {} removed {} from {}", actor.id, target, project_id);
        Ok(removed)
    }

    /// Invitation preview for a pending invitee
    pub async fn invitation_details(
        &self,
        project_id: Uuid,
        caller: &Caller,
    ) -> BackendResult<InvitationPreview> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        let entry = project
            .member(caller.id)
            .filter(|m| m.status == MemberStatus::Pending)
            .ok_or_else(|| BackendError::not_found("Invitation not found"))?;

        let others: Vec<Uuid> = project
            .members
            .iter()
            .filter(|m| m.status == MemberStatus::Joined && m.user != caller.id)
            .map(|m| m.user)
            .collect();
        let members = self
            .store
            .get_users(&others)
            .await?
            .iter()
            .map(|u| u.profile())
            .collect();

        Ok(InvitationPreview {
            project: project.summary(),
            description: project.description.clone(),
            role: entry.role,
            members,
        })
    }

    /// Members of a project, for a joined member, optionally filtered by name or email
    pub async fn list_members(
        &self,
        project_id: Uuid,
        caller: &Caller,
        search: Option<&str>,
    ) -> BackendResult<Vec<MemberView>> {
        let project = load_active(self.store.as_ref(), project_id).await?;
        require_joined(&project, caller.id)?;

        let ids: Vec<Uuid> = project.members.iter().map(|m| m.user).collect();
        let users = self.store.get_users(&ids).await?;
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(project
            .members
            .iter()
            .filter_map(|m| {
                let user = users.iter().find(|u| u.id == m.user)?;
                if let Some(n) = &needle {
                    let hit = user.display_name.to_lowercase().contains(n)
                        || user.email.contains(n);
                    if !hit {
                        return None;
                    }
                }
                Some(MemberView {
                    user: user.profile(),
                    email: user.email.clone(),
                    role: m.role,
                    status: m.status,
                })
            })
            .collect())
    }
}
