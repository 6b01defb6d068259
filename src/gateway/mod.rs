//! Tutor backend gateway
//!
//! One method per backend endpoint. Every call is a single request: no
//! retries, no backoff, no client-side timeout. Callers decide how a failure
//! is shown to the user.

mod http;
pub mod types;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::conversation::{Conversation, ConversationId, Message};

pub use http::HttpGateway;
pub use types::*;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The backend's own explanation, when it gave one
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Status { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Everything the client asks of the tutor backend
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, GatewayError>;

    async fn create_conversation(
        &self,
        request: &NewConversation,
    ) -> Result<CreatedConversation, GatewayError>;

    async fn rename_conversation(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<RenamedConversation, GatewayError>;

    async fn delete_conversation(&self, id: ConversationId) -> Result<DeleteStatus, GatewayError>;

    async fn delete_all_conversations(&self, user_id: UserId) -> Result<DeleteStatus, GatewayError>;

    async fn list_messages(&self, id: ConversationId) -> Result<Vec<Message>, GatewayError>;

    async fn send_message(
        &self,
        id: ConversationId,
        message: &str,
    ) -> Result<SendMessageResponse, GatewayError>;

    async fn list_memories(&self, user_id: UserId) -> Result<Vec<Memory>, GatewayError>;

    async fn flush_memories(&self, user_id: UserId) -> Result<DeleteStatus, GatewayError>;

    async fn list_users(&self) -> Result<Vec<UserInfo>, GatewayError>;

    async fn model_settings(&self, user_id: UserId) -> Result<ModelSettings, GatewayError>;

    async fn update_model_settings(
        &self,
        user_id: UserId,
        update: &ModelSettingsUpdate,
    ) -> Result<ModelSettingsAck, GatewayError>;

    async fn user_stats(&self, user_id: UserId) -> Result<UserStats, GatewayError>;

    async fn enhance_prompt(&self, prompt: &str) -> Result<EnhancedPrompt, GatewayError>;

    /// Backend banner from `GET /`
    async fn health(&self) -> Result<String, GatewayError>;
}
