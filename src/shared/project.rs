//! Project and Member Data Structures
//!
//! A project embeds its ordered member list. The project key is derived once,
//! when the project value is constructed, and never recomputed afterwards.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{require_text, SharedError};

/// Role a member holds in a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    Write,
    #[default]
    Read,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "OWNER",
            MemberRole::Admin => "ADMIN",
            MemberRole::Write => "WRITE",
            MemberRole::Read => "READ",
        }
    }

    /// Owners and admins manage membership
    pub fn can_manage_members(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    #[default]
    Pending,
    Joined,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    Personal,
    #[default]
    Shared,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Deleted,
}

/// A (user, role, status) association embedded in a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub user: Uuid,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default)]
    pub status: MemberStatus,
}

impl Member {
    pub fn pending(user: Uuid, role: MemberRole) -> Self {
        Self {
            user,
            role,
            status: MemberStatus::Pending,
        }
    }

    pub fn owner(user: Uuid) -> Self {
        Self {
            user,
            role: MemberRole::Owner,
            status: MemberStatus::Joined,
        }
    }
}

/// A shared project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Short code used to prefix task keys
    pub key: String,
    #[serde(rename = "type", default)]
    pub project_type: ProjectType,
    #[serde(default = "default_true")]
    pub chat_enabled: bool,
    pub members: Vec<Member>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Project {
    /// Create a project owned by `owner`, deriving its key from the name.
    pub fn new(
        owner: Uuid,
        name: &str,
        description: Option<String>,
        project_type: ProjectType,
    ) -> Result<Self, SharedError> {
        let name = require_text("name", name)?;
        let key = derive_project_key(&name, &mut rand::rng());
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            key,
            project_type,
            chat_enabled: true,
            members: vec![Member::owner(owner)],
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn member(&self, user: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.user == user)
    }

    pub fn member_mut(&mut self, user: Uuid) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.user == user)
    }

    /// Member entry for `user` only if it has joined
    pub fn joined_member(&self, user: Uuid) -> Option<&Member> {
        self.member(user).filter(|m| m.status == MemberStatus::Joined)
    }

    /// Remove the entry for `user`, returning it if present
    pub fn remove_member(&mut self, user: Uuid) -> Option<Member> {
        let index = self.members.iter().position(|m| m.user == user)?;
        Some(self.members.remove(index))
    }

    /// Whether at least one joined member holds the OWNER role
    pub fn has_owner(&self) -> bool {
        self.members
            .iter()
            .any(|m| m.role == MemberRole::Owner && m.status == MemberStatus::Joined)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            key: self.key.clone(),
        }
    }
}

/// Cached `{name, key}` view of a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub key: String,
}

/// Derive a project key: the first character of the name followed by two
/// characters drawn at random from the rest of the name (whitespace removed),
/// uppercased.
pub fn derive_project_key<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    let mut chars = name.trim().chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let pool: Vec<char> = chars.filter(|c| !c.is_whitespace()).collect();

    let mut key = String::new();
    key.push(first);
    if !pool.is_empty() {
        for _ in 0..2 {
            key.push(pool[rng.random_range(0..pool.len())]);
        }
    }
    key.to_uppercase()
}
