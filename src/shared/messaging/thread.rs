//! Direct-message thread.
//!
//! A thread is identified within its project by the exact set of participants.
//! `MemberSet` holds that set in canonical (sorted, deduplicated) form so two
//! requests naming the same people in any order produce the same key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical participant set of a thread
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet(Vec<Uuid>);

impl MemberSet {
    /// `{sender} ∪ receivers`
    pub fn from_participants(sender: Uuid, receivers: &[Uuid]) -> Self {
        let mut members: Vec<Uuid> = receivers.to_vec();
        members.push(sender);
        members.sort();
        members.dedup();
        Self(members)
    }

    /// Natural key used for the uniqueness constraint
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn contains(&self, user: Uuid) -> bool {
        self.0.binary_search(&user).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Uuid] {
        &self.0
    }
}

/// A direct-message thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatThread {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub project: Uuid,
    /// User who opened the thread
    pub sender: Uuid,
    pub receiver: Vec<Uuid>,
    pub members: MemberSet,
    #[serde(default)]
    pub last_message: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ChatThread {
    pub fn new(project: Uuid, sender: Uuid, receivers: Vec<Uuid>) -> Self {
        let members = MemberSet::from_participants(sender, &receivers);
        Self {
            id: Uuid::new_v4(),
            project,
            sender,
            receiver: receivers,
            members,
            last_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn member_key(&self) -> String {
        self.members.key()
    }

    /// Every thread member other than `user`
    pub fn others(&self, user: Uuid) -> Vec<Uuid> {
        self.members
            .as_slice()
            .iter()
            .copied()
            .filter(|id| *id != user)
            .collect()
    }
}

/// Request to open (or find) a direct thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateThreadRequest {
    pub receiver: Vec<Uuid>,
}
