//! User and caller identity types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user record as held by the document store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Stored lowercase
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into().trim().to_lowercase(),
            display_name: display_name.into(),
            first_name: None,
            last_name: None,
            profile_picture: None,
        }
    }

    /// Public profile fields, safe to embed in payloads
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            display_name: self.display_name.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }
}

/// Public subset of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

/// Authenticated identity attached to every inbound request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub display_name: String,
    pub profile_picture: Option<String>,
    pub email: String,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            profile_picture: user.profile_picture.clone(),
            email: user.email.clone(),
        }
    }
}

impl Caller {
    /// Sender block embedded in chat payloads
    pub fn sender_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "_id": self.id,
            "display_name": self.display_name,
            "profile_picture": self.profile_picture,
            "email": self.email,
        })
    }
}
