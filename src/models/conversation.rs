//! Conversation and chat models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

/// Conversation entry as listed in the sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conversation: String,
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Message inside an opened conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Wire shape of `GET /conversation/get` rows, timestamp still textual.
#[derive(Debug, Deserialize)]
pub(crate) struct RawConversation {
    pub conversation: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Wire shape of `GET /conversation/get/{id}` rows.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<RawConversation> for ConversationSummary {
    fn from(raw: RawConversation) -> Self {
        Self {
            created_at: raw.created_at.as_deref().and_then(parse_timestamp),
            conversation: raw.conversation,
            title: raw.title,
        }
    }
}

impl From<RawMessage> for ConversationMessage {
    fn from(raw: RawMessage) -> Self {
        Self {
            created_at: raw.created_at.as_deref().and_then(parse_timestamp),
            text: raw.text,
        }
    }
}

/// Parse a backend timestamp.
///
/// Accepts the HTTP-date form Flask emits (`Tue, 14 Oct 2025 10:00:00 GMT`),
/// RFC 3339, and naive ISO-8601 (taken as UTC). Anything else yields `None`.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    tracing::debug!("Unparseable timestamp: {:?}", text);
    None
}

/// File attached to a chat message
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Read an attachment from disk.
    pub fn from_path(path: &PathBuf) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        Ok(Self { file_name, bytes })
    }
}

/// One outgoing chat message. `conversation: None` starts a new conversation.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub conversation: Option<String>,
    pub content: String,
    pub file: Option<Attachment>,
}

/// Response of `POST /ai/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub conversation: Option<String>,
}
