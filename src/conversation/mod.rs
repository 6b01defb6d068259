//! Conversation types and the client-side transcript

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::prompts::builtin;

/// Backend conversation identifier
pub type ConversationId = i64;

/// Marks client events posted to the backend as ordinary user messages
pub const EVENT_PREFIX: &str = "[SYSTEM] ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A conversation as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 timestamps and naive ones (taken as UTC); anything else is dropped
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}

/// Ordered message sequence of the active conversation.
///
/// Append-only: messages are only ever pushed, and their order is the order
/// they were shown to the user.
#[derive(Debug, Clone)]
pub struct Transcript {
    conversation_id: ConversationId,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            messages: Vec::new(),
        }
    }

    /// Build a transcript from fetched history.
    ///
    /// A conversation with no history gets the tutor greeting instead. Events
    /// the client posted come back as user messages and are shown as system
    /// lines again.
    pub fn from_history(conversation_id: ConversationId, history: Vec<Message>) -> Self {
        let messages = if history.is_empty() {
            greeting()
        } else {
            history.into_iter().map(restore_event).collect()
        };
        Self {
            conversation_id,
            messages,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_user(&mut self, content: &str) {
        self.push(Message::user(content));
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.push(Message::assistant(content));
    }

    pub fn add_system(&mut self, content: &str) {
        self.push(Message::system(content));
    }
}

/// Local messages shown for a conversation with no history
pub fn greeting() -> Vec<Message> {
    vec![
        Message::assistant(builtin::GREETING),
        Message::assistant(builtin::CAPABILITIES),
    ]
}

fn restore_event(message: Message) -> Message {
    if message.role == Role::User && message.content.starts_with(EVENT_PREFIX) {
        Message::system(message.content)
    } else {
        message
    }
}
