//! reqwest implementation of [`Backend`]

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::conversation::{Conversation, ConversationId, Message};

use super::types::*;
use super::{Backend, GatewayError};

/// FastAPI-style error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Talks to the tutor backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| match e.detail {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or(body);
            tracing::warn!(%status, path = %url, "backend error: {}", detail);
            return Err(GatewayError::Status { status, detail });
        }

        tracing::debug!(%status, path = %url, "backend response");
        serde_json::from_str(&body).map_err(|e| {
            GatewayError::Decode(format!("Failed to parse response: {} - Body: {}", e, body))
        })
    }
}

#[async_trait]
impl Backend for HttpGateway {
    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, GatewayError> {
        self.call(self.client.get(self.url(&format!("/conversations?user_id={}", user_id))))
            .await
    }

    async fn create_conversation(
        &self,
        request: &NewConversation,
    ) -> Result<CreatedConversation, GatewayError> {
        self.call(self.client.post(self.url("/conversations")).json(request))
            .await
    }

    async fn rename_conversation(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<RenamedConversation, GatewayError> {
        let body = RenameConversation {
            title: title.to_string(),
        };
        self.call(
            self.client
                .patch(self.url(&format!("/conversations/{}", id)))
                .json(&body),
        )
        .await
    }

    async fn delete_conversation(&self, id: ConversationId) -> Result<DeleteStatus, GatewayError> {
        self.call(self.client.delete(self.url(&format!("/conversations/{}", id))))
            .await
    }

    async fn delete_all_conversations(&self, user_id: UserId) -> Result<DeleteStatus, GatewayError> {
        self.call(
            self.client
                .delete(self.url(&format!("/conversations?user_id={}", user_id))),
        )
        .await
    }

    async fn list_messages(&self, id: ConversationId) -> Result<Vec<Message>, GatewayError> {
        self.call(
            self.client
                .get(self.url(&format!("/conversations/{}/messages", id))),
        )
        .await
    }

    async fn send_message(
        &self,
        id: ConversationId,
        message: &str,
    ) -> Result<SendMessageResponse, GatewayError> {
        let body = SendMessage {
            message: message.to_string(),
        };
        self.call(
            self.client
                .post(self.url(&format!("/conversations/{}/messages", id)))
                .json(&body),
        )
        .await
    }

    async fn list_memories(&self, user_id: UserId) -> Result<Vec<Memory>, GatewayError> {
        self.call(self.client.get(self.url(&format!("/memories?user_id={}", user_id))))
            .await
    }

    async fn flush_memories(&self, user_id: UserId) -> Result<DeleteStatus, GatewayError> {
        self.call(
            self.client
                .delete(self.url(&format!("/memories?user_id={}", user_id))),
        )
        .await
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>, GatewayError> {
        self.call(self.client.get(self.url("/users"))).await
    }

    async fn model_settings(&self, user_id: UserId) -> Result<ModelSettings, GatewayError> {
        self.call(
            self.client
                .get(self.url(&format!("/users/{}/settings/model", user_id))),
        )
        .await
    }

    async fn update_model_settings(
        &self,
        user_id: UserId,
        update: &ModelSettingsUpdate,
    ) -> Result<ModelSettingsAck, GatewayError> {
        self.call(
            self.client
                .post(self.url(&format!("/users/{}/settings/model", user_id)))
                .json(update),
        )
        .await
    }

    async fn user_stats(&self, user_id: UserId) -> Result<UserStats, GatewayError> {
        self.call(self.client.get(self.url(&format!("/users/{}/stats", user_id))))
            .await
    }

    async fn enhance_prompt(&self, prompt: &str) -> Result<EnhancedPrompt, GatewayError> {
        let body = EnhancePrompt {
            prompt: prompt.to_string(),
        };
        self.call(self.client.post(self.url("/enhance-prompt")).json(&body))
            .await
    }

    async fn health(&self) -> Result<String, GatewayError> {
        let status: HealthStatus = self.call(self.client.get(self.url("/"))).await?;
        Ok(status.message)
    }
}
