//! Side-effect commands returned by handlers
//!
//! Handlers never touch the terminal, the browser or the filesystem on their
//! own; they return [`Effect`]s and the front end decides how to carry them
//! out. This keeps every handler testable without a UI.

use std::time::Duration;

use crate::conversation::ConversationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// An action that needs the user's confirmation first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteConversation(ConversationId),
    DeleteAllConversations,
    FlushMemories,
}

impl PendingAction {
    pub fn prompt(&self) -> &'static str {
        match self {
            PendingAction::DeleteConversation(_) => "Delete this conversation?",
            PendingAction::DeleteAllConversations => {
                "Delete ALL your conversations? This cannot be undone."
            }
            PendingAction::FlushMemories => {
                "Are you sure you want to delete ALL your memories? This cannot be undone."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the user; run `action` only if they accept
    Confirm(PendingAction),

    /// Short notice outside the transcript
    Toast { kind: ToastKind, text: String },

    /// Conversation list changed on the backend; refetch and redraw
    Reload,

    /// Open a link in the user's browser
    OpenUrl(String),

    /// Hand a document to the system print facility
    Print { title: String, html: String },

    /// Save a document locally
    Download { file_name: String, contents: String },

    /// Switch to a rolled-over conversation once `after` has elapsed
    ScheduleRollover {
        conversation_id: ConversationId,
        after: Duration,
    },
}

impl Effect {
    pub fn info(text: impl Into<String>) -> Self {
        Effect::Toast {
            kind: ToastKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Effect::Toast {
            kind: ToastKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Effect::Toast {
            kind: ToastKind::Error,
            text: text.into(),
        }
    }
}
