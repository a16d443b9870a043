//! Chat Message Data Structure
//!
//! A message posted either into a project's room or into a direct thread.
//! Messages are append-only; the store assigns `seq` on insert so that messages
//! sharing a send timestamp still have a stable order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    Video,
    Audio,
}

impl MessageKind {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::Image => "IMAGE",
            MessageKind::File => "FILE",
            MessageKind::Video => "VIDEO",
            MessageKind::Audio => "AUDIO",
        }
    }

    /// Parse from string (database)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(MessageKind::Text),
            "IMAGE" => Some(MessageKind::Image),
            "FILE" => Some(MessageKind::File),
            "VIDEO" => Some(MessageKind::Video),
            "AUDIO" => Some(MessageKind::Audio),
            _ => None,
        }
    }
}

/// Uploaded attachment reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Validated message content: text for TEXT, attachments for everything else
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    kind: MessageKind,
    message: Option<String>,
    document: Vec<Attachment>,
}

impl MessageBody {
    pub fn new(
        kind: MessageKind,
        message: Option<String>,
        attachments: Vec<Attachment>,
    ) -> Result<Self, SharedError> {
        match kind {
            MessageKind::Text => {
                let text = message
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| SharedError::validation("message", "Please provide a message"))?;
                Ok(Self {
                    kind,
                    message: Some(text),
                    document: Vec::new(),
                })
            }
            _ => {
                if attachments.is_empty() {
                    return Err(SharedError::validation(
                        "attachments",
                        format!("A {} message needs at least one attachment", kind.as_str()),
                    ));
                }
                Ok(Self {
                    kind,
                    message: None,
                    document: attachments,
                })
            }
        }
    }

    pub fn text(message: impl Into<String>) -> Result<Self, SharedError> {
        Self::new(MessageKind::Text, Some(message.into()), Vec::new())
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Insertion order assigned by the store
    #[serde(default)]
    pub seq: u64,
    /// Direct thread this message belongs to; `None` for the project room
    #[serde(default)]
    pub chat_id: Option<Uuid>,
    pub project: Uuid,
    pub sender: Uuid,
    #[serde(default)]
    pub receiver: Vec<Uuid>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub document: Vec<Attachment>,
    #[serde(default)]
    pub read_by: Vec<Uuid>,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn build(
        chat_id: Option<Uuid>,
        project: Uuid,
        sender: Uuid,
        receiver: Vec<Uuid>,
        body: MessageBody,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq: 0,
            chat_id,
            project,
            sender,
            receiver,
            kind: body.kind,
            message: body.message,
            document: body.document,
            read_by: Vec::new(),
            sent_at: Utc::now(),
        }
    }

    /// New message for a direct thread
    pub fn direct(thread: Uuid, project: Uuid, sender: Uuid, receiver: Vec<Uuid>, body: MessageBody) -> Self {
        Self::build(Some(thread), project, sender, receiver, body)
    }

    /// New message for a project room
    pub fn room(project: Uuid, sender: Uuid, body: MessageBody) -> Self {
        Self::build(None, project, sender, Vec::new(), body)
    }

    pub fn is_direct(&self) -> bool {
        self.chat_id.is_some()
    }

    /// Ordering key within a channel
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.sent_at, self.seq)
    }

    /// Record that `user` has read the message; returns false if already recorded
    pub fn mark_read_by(&mut self, user: Uuid) -> bool {
        if self.read_by.contains(&user) {
            return false;
        }
        self.read_by.push(user);
        true
    }
}

/// Body of a chat post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Direct-thread receivers; defaults to the other thread members
    #[serde(default)]
    pub receiver: Option<Vec<Uuid>>,
}

impl SendMessageRequest {
    pub fn body(&self) -> Result<MessageBody, SharedError> {
        MessageBody::new(self.kind, self.message.clone(), self.attachments.clone())
    }
}

/// Pagination window for room history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}
