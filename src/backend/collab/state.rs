/**
 * Collab Session Registry
 *
 * Ephemeral co-editing sessions and their live participant rosters. Sessions
 * exist only in process memory:
 *
 * ```text
 * create -> active (roster >= 1) -- join / leave --> active
 *                                  \-- last leave / teardown --> destroyed
 * ```
 *
 * Each session lives in its own `DashMap` entry, so join/leave on one session
 * never waits on another. `leave` removes the participant and, when the roster
 * is empty, the session itself while still holding the entry lock. A `join`
 * racing with the final `leave` therefore sees either the old roster or
 * NotFound, never a half-destroyed session.
 */

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::{DeliveryOutcome, NotificationRouter};
use crate::shared::{notification::NotificationPayload, user::Caller, LiveEvent};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Participant {
    pub user: Uuid,
    pub display_name: String,
    pub profile_picture: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    fn from_caller(caller: &Caller) -> Self {
        Self {
            user: caller.id,
            display_name: caller.display_name.clone(),
            profile_picture: caller.profile_picture.clone(),
            joined_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
struct CollabSession {
    project: Uuid,
    creator: Uuid,
    roster: BTreeMap<Uuid, Participant>,
    created_at: DateTime<Utc>,
}

/// Snapshot of a session returned to callers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub project: Uuid,
    pub creator: Uuid,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
}

impl SessionView {
    fn of(id: Uuid, session: &CollabSession) -> Self {
        let mut participants: Vec<Participant> = session.roster.values().cloned().collect();
        participants.sort_by_key(|p| p.joined_at);
        Self {
            id,
            project: session.project,
            creator: session.creator,
            participants,
            created_at: session.created_at,
        }
    }

    pub fn has_participant(&self, user: Uuid) -> bool {
        self.participants.iter().any(|p| p.user == user)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Remaining roster; `None` once the session is destroyed
    pub session: Option<SessionView>,
    pub destroyed: bool,
}

pub struct SessionRegistry {
    sessions: DashMap<Uuid, CollabSession>,
    router: NotificationRouter,
}

impl SessionRegistry {
    pub fn new(router: NotificationRouter) -> Self {
        Self {
            sessions: DashMap::new(),
            router,
        }
    }

    fn not_found() -> BackendError {
        BackendError::not_found("Collab session not found")
    }

    /// Start a session with `creator` as its only participant
    pub fn create(&self, project: Uuid, creator: &Caller) -> SessionView {
        let id = Uuid::new_v4();
        let mut roster = BTreeMap::new();
        roster.insert(creator.id, Participant::from_caller(creator));
        let session = CollabSession {
            project,
            creator: creator.id,
            roster,
            created_at: Utc::now(),
        };
        let view = SessionView::of(id, &session);
        self.sessions.insert(id, session);
        tracing::info!("[Collab] {} started session {} in {}", creator.id, id, project);
        view
    }

    /// Add `user` to the roster. Rejoining is a no-op.
    pub fn join(&self, id: Uuid, user: &Caller) -> BackendResult<SessionView> {
        let mut session = self.sessions.get_mut(&id).ok_or_else(Self::not_found)?;
        session
            .roster
            .entry(user.id)
            .or_insert_with(|| Participant::from_caller(user));
        Ok(SessionView::of(id, &session))
    }

    /// Remove `user`; destroys the session when the roster becomes empty
    pub fn leave(&self, id: Uuid, user: Uuid) -> BackendResult<LeaveOutcome> {
        match self.sessions.entry(id) {
            Entry::Vacant(_) => Err(Self::not_found()),
            Entry::Occupied(mut slot) => {
                slot.get_mut().roster.remove(&user);
                if slot.get().roster.is_empty() {
                    slot.remove();
                    tracing::info!("[Collab] Session {} destroyed", id);
                    Ok(LeaveOutcome {
                        session: None,
                        destroyed: true,
                    })
                } else {
                    Ok(LeaveOutcome {
                        session: Some(SessionView::of(id, slot.get())),
                        destroyed: false,
                    })
                }
            }
        }
    }

    /// Destroy regardless of roster. Returns whether the session existed.
    pub fn teardown(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn get(&self, id: Uuid) -> Option<SessionView> {
        self.sessions.get(&id).map(|s| SessionView::of(id, &s))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Notify each invitee with a redirect to the session. The session is not
    /// mutated; one failed delivery never stops the rest.
    pub async fn invite(
        &self,
        id: Uuid,
        project: Uuid,
        inviter: &Caller,
        invitees: &[Uuid],
    ) -> BackendResult<Vec<DeliveryOutcome>> {
        let session = self
            .get(id)
            .filter(|s| s.project == project)
            .ok_or_else(Self::not_found)?;

        let mut targets: Vec<Uuid> = invitees
            .iter()
            .copied()
            .filter(|u| *u != inviter.id)
            .collect();
        targets.sort();
        targets.dedup();
        if targets.is_empty() {
            return Err(BackendError::validation("invitees", "Please provide at least one invitee"));
        }

        let redirect = format!("/project/{}/collab/{}", project, session.id);
        let message = format!("{} invited you to a live session", inviter.display_name);
        let name = inviter.display_name.clone();
        let picture = inviter.profile_picture.clone();

        let outcomes = self
            .router
            .notify_users(&targets, LiveEvent::NewNotification, |_| {
                NotificationPayload::actionable(message.clone(), redirect.clone())
                    .with_action_title("Join session")
                    .with_initiator(name.clone(), picture.clone())
            })
            .await;
        let failed = outcomes.iter().filter(|o| !o.delivered).count();
        tracing::info!(
            "[Collab] Session {} invites: {} sent, {} failed",
            id,
            outcomes.len() - failed,
            failed
        );
        Ok(outcomes)
    }
}
