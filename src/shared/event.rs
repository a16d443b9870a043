/**
 * Real-time Event System
 *
 * This module defines the live events pushed to open connections. Every event
 * carries one of the three wire names clients listen for, a JSON payload and the
 * time it was emitted.
 */
use serde::{Deserialize, Serialize};

/// Name of a live event as seen by clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LiveEvent {
    /// In-app notification (invites, joins, permission changes)
    #[serde(rename = "new-notification")]
    NewNotification,
    /// Project room chat message
    #[serde(rename = "chat-message")]
    ChatMessage,
    /// Direct-thread chat message
    #[serde(rename = "personal-chat")]
    PersonalChat,
}

impl LiveEvent {
    /// Wire name used as the SSE `event:` field
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveEvent::NewNotification => "new-notification",
            LiveEvent::ChatMessage => "chat-message",
            LiveEvent::PersonalChat => "personal-chat",
        }
    }
}

impl std::fmt::Display for LiveEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Real-time event delivered to a live connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtimeEvent {
    /// Event name
    pub event: LiveEvent,
    /// Event payload (JSON-serializable data)
    pub payload: serde_json::Value,
    /// Timestamp when event was emitted (RFC3339)
    pub timestamp: String,
}

impl RealtimeEvent {
    /// Create a new real-time event
    pub fn new(event: LiveEvent, payload: serde_json::Value) -> Self {
        Self {
            event,
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a `new-notification` event
    pub fn notification(payload: serde_json::Value) -> Self {
        Self::new(LiveEvent::NewNotification, payload)
    }

    /// Create a `chat-message` event
    pub fn chat_message(payload: serde_json::Value) -> Self {
        Self::new(LiveEvent::ChatMessage, payload)
    }

    /// Create a `personal-chat` event
    pub fn personal_chat(payload: serde_json::Value) -> Self {
        Self::new(LiveEvent::PersonalChat, payload)
    }
}
