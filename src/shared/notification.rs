//! Durable notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a notification was addressed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "target", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationScope {
    User(Uuid),
    Project(Uuid),
}

/// Notification body, also used verbatim as the live event payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NotificationPayload {
    pub message: String,
    pub is_actionable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_profile: Option<String>,
}

impl NotificationPayload {
    pub fn informational(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_actionable: false,
            ..Default::default()
        }
    }

    pub fn actionable(message: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_actionable: true,
            redirect_url: Some(redirect_url.into()),
            ..Default::default()
        }
    }

    pub fn with_action_title(mut self, title: impl Into<String>) -> Self {
        self.action_title = Some(title.into());
        self
    }

    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    pub fn with_initiator(mut self, name: impl Into<String>, profile: Option<String>) -> Self {
        self.initiator_name = Some(name.into());
        self.initiator_profile = profile;
        self
    }
}

/// Immutable record of a routed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: NotificationScope,
    pub payload: NotificationPayload,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(scope: NotificationScope, payload: NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            payload,
            created_at: Utc::now(),
        }
    }
}
