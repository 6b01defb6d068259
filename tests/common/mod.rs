//! In-process mock of the tutor backend
//!
//! Serves the same routes as the real backend from an `axum` router bound to
//! an ephemeral port. Replies are canned and keyed on the message text:
//!
//! - `rollover` rolls the chat over into a fresh conversation
//! - `quiz`, `cheatsheet` and `resources` answer with the matching block
//! - anything else is echoed back as `You said: <text>`

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use tutor_client::conversation::{Conversation, ConversationId, Message};
use tutor_client::gateway::{
    CreatedConversation, DeleteStatus, EnhancePrompt, EnhancedPrompt, Memory, ModelSettings,
    ModelSettingsAck, ModelSettingsUpdate, NewConversation, ProviderInfo, RenameConversation,
    RenamedConversation, SendMessage, SendMessageResponse, UserId, UserInfo, UserStats,
};

pub const QUIZ_REPLY: &str = r#"Let's check what stuck.

:::quiz
[
  {"question": "Which keyword declares an immutable binding?", "options": ["let", "mut", "static"], "correct_answer": "let", "hint": "Mutability is opt-in", "xp_reward": 100, "explanation": "Bindings are immutable unless marked mut."},
  {"question": "What does ? do on an Err?", "options": ["Panics", "Returns early", "Ignores it"], "correctAnswer": "Returns early", "xpReward": 80}
]
:::"#;

pub const CHEATSHEET_REPLY: &str = r#"Here you go!
:::cheatsheet
{"topic": "Rust Traits", "html": "<html><body><h1>Traits</h1><ul><li>impl Trait for Type</li></ul></body></html>"}
:::"#;

pub const RESOURCES_REPLY: &str = r#":::resources
{"query": "rust async", "resources": [{"title": "Async Book", "url": "https://rust-lang.github.io/async-book/", "description": "The official guide"}]}
:::
Happy reading!"#;

pub const ROLLOVER_NOTICE: &str = "This chat got long, so I saved a summary and started a new one.";

type Shared = Arc<Mutex<MockState>>;
type ApiError = (StatusCode, Json<Value>);

pub struct MockState {
    pub users: Vec<UserInfo>,
    /// Conversations with their owner
    pub conversations: Vec<(UserId, Conversation)>,
    pub messages: HashMap<ConversationId, Vec<Message>>,
    pub memories: HashMap<UserId, Vec<Memory>>,
    pub settings: HashMap<UserId, (String, Option<String>)>,
    /// Every message posted, in order
    pub sent: Vec<(ConversationId, String)>,
    next_id: ConversationId,
}

impl MockState {
    fn seeded() -> Self {
        let mut memories = HashMap::new();
        memories.insert(
            1,
            vec![
                Memory {
                    id: 1,
                    content: "Name is Ada".into(),
                    category: "user_profile".into(),
                    created_at: None,
                },
                Memory {
                    id: 2,
                    content: "Learns best from small examples".into(),
                    category: "learning_preference".into(),
                    created_at: None,
                },
            ],
        );

        Self {
            users: vec![
                UserInfo {
                    id: 1,
                    username: "ada".into(),
                },
                UserInfo {
                    id: 2,
                    username: "grace".into(),
                },
            ],
            conversations: Vec::new(),
            messages: HashMap::new(),
            memories,
            settings: HashMap::new(),
            sent: Vec::new(),
            next_id: 0,
        }
    }

    fn create(&mut self, user_id: UserId, title: &str) -> ConversationId {
        self.next_id += 1;
        let id = self.next_id;
        self.conversations.insert(
            0,
            (
                user_id,
                Conversation {
                    id,
                    title: title.to_string(),
                    created_at: Some(Utc::now()),
                },
            ),
        );
        self.messages.insert(id, Vec::new());
        id
    }

    fn owner(&self, id: ConversationId) -> Option<UserId> {
        self.conversations
            .iter()
            .find(|(_, c)| c.id == id)
            .map(|(user, _)| *user)
    }
}

pub struct MockBackend {
    pub url: String,
    pub state: Shared,
}

impl MockBackend {
    /// Add a conversation directly, bypassing the HTTP API
    pub fn seed_conversation(&self, user_id: UserId, title: &str) -> ConversationId {
        self.state.lock().unwrap().create(user_id, title)
    }

    pub fn sent(&self) -> Vec<(ConversationId, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn conversation_ids(&self, user_id: UserId) -> Vec<ConversationId> {
        self.state
            .lock()
            .unwrap()
            .conversations
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, c)| c.id)
            .collect()
    }
}

/// Start the mock on 127.0.0.1 with a free port
pub async fn spawn() -> MockBackend {
    let state: Shared = Arc::new(Mutex::new(MockState::seeded()));
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        url: format!("http://{}", addr),
        state,
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/users", get(list_users))
        .route(
            "/conversations",
            get(list_conversations)
                .post(create_conversation)
                .delete(delete_all_conversations),
        )
        .route(
            "/conversations/:id",
            patch(rename_conversation).delete(delete_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(list_messages).post(send_message),
        )
        .route("/memories", get(list_memories).delete(flush_memories))
        .route(
            "/users/:id/settings/model",
            get(model_settings).post(update_model_settings),
        )
        .route("/users/:id/stats", get(user_stats))
        .route("/enhance-prompt", post(enhance_prompt))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{} not found", what) })),
    )
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: UserId,
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Agentic AI Tutor Backend Running" }))
}

async fn list_users(State(state): State<Shared>) -> Json<Vec<UserInfo>> {
    Json(state.lock().unwrap().users.clone())
}

async fn list_conversations(
    State(state): State<Shared>,
    Query(query): Query<UserQuery>,
) -> Json<Vec<Conversation>> {
    let state = state.lock().unwrap();
    Json(
        state
            .conversations
            .iter()
            .filter(|(user, _)| *user == query.user_id)
            .map(|(_, c)| c.clone())
            .collect(),
    )
}

async fn create_conversation(
    State(state): State<Shared>,
    Json(request): Json<NewConversation>,
) -> Json<CreatedConversation> {
    let id = state
        .lock()
        .unwrap()
        .create(request.user_id, &request.title);
    Json(CreatedConversation {
        id,
        title: request.title,
        is_guest_mode: request.is_guest_mode,
    })
}

async fn delete_all_conversations(
    State(state): State<Shared>,
    Query(query): Query<UserQuery>,
) -> Json<DeleteStatus> {
    let mut state = state.lock().unwrap();
    let before = state.conversations.len();
    state.conversations.retain(|(user, _)| *user != query.user_id);
    let count = (before - state.conversations.len()) as u64;
    Json(DeleteStatus {
        status: "deleted".into(),
        count: Some(count),
    })
}

async fn rename_conversation(
    State(state): State<Shared>,
    Path(id): Path<ConversationId>,
    Json(request): Json<RenameConversation>,
) -> Result<Json<RenamedConversation>, ApiError> {
    let mut state = state.lock().unwrap();
    let (_, conv) = state
        .conversations
        .iter_mut()
        .find(|(_, c)| c.id == id)
        .ok_or_else(|| not_found("Conversation"))?;
    conv.title = request.title.clone();
    Ok(Json(RenamedConversation {
        id,
        title: request.title,
    }))
}

async fn delete_conversation(
    State(state): State<Shared>,
    Path(id): Path<ConversationId>,
) -> Result<Json<DeleteStatus>, ApiError> {
    let mut state = state.lock().unwrap();
    state.owner(id).ok_or_else(|| not_found("Conversation"))?;
    state.conversations.retain(|(_, c)| c.id != id);
    state.messages.remove(&id);
    Ok(Json(DeleteStatus {
        status: "deleted".into(),
        count: None,
    }))
}

async fn list_messages(
    State(state): State<Shared>,
    Path(id): Path<ConversationId>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let state = state.lock().unwrap();
    state
        .messages
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Conversation"))
}

async fn send_message(
    State(state): State<Shared>,
    Path(id): Path<ConversationId>,
    Json(request): Json<SendMessage>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let mut state = state.lock().unwrap();
    let owner = state.owner(id).ok_or_else(|| not_found("Conversation"))?;
    let text = request.message;
    state.sent.push((id, text.clone()));

    if text.contains("rollover") {
        let new_id = state.create(owner, "Continued Chat");
        return Ok(Json(SendMessageResponse {
            response: ROLLOVER_NOTICE.into(),
            new_conversation_id: Some(new_id),
            new_title: Some("Continued Chat".into()),
        }));
    }

    let reply = if text.starts_with("[SYSTEM] Quiz completed") {
        "Great work on the quiz!".to_string()
    } else if text.contains("quiz") || text.contains("Quiz") {
        QUIZ_REPLY.to_string()
    } else if text.contains("cheatsheet") {
        CHEATSHEET_REPLY.to_string()
    } else if text.contains("resources") {
        RESOURCES_REPLY.to_string()
    } else {
        format!("You said: {}", text)
    };

    let history = state.messages.entry(id).or_default();
    history.push(Message::user(text));
    history.push(Message::assistant(reply.clone()));

    Ok(Json(SendMessageResponse {
        response: reply,
        new_conversation_id: None,
        new_title: None,
    }))
}

async fn list_memories(
    State(state): State<Shared>,
    Query(query): Query<UserQuery>,
) -> Json<Vec<Memory>> {
    let state = state.lock().unwrap();
    Json(state.memories.get(&query.user_id).cloned().unwrap_or_default())
}

async fn flush_memories(
    State(state): State<Shared>,
    Query(query): Query<UserQuery>,
) -> Json<DeleteStatus> {
    let removed = state
        .lock()
        .unwrap()
        .memories
        .remove(&query.user_id)
        .map(|m| m.len() as u64)
        .unwrap_or(0);
    Json(DeleteStatus {
        status: "flushed".into(),
        count: Some(removed),
    })
}

fn providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            id: "claude".into(),
            name: "Claude (Default)".into(),
            requires_key: false,
        },
        ProviderInfo {
            id: "groq".into(),
            name: "GROQ (Llama 3.3 70B)".into(),
            requires_key: true,
        },
    ]
}

async fn model_settings(
    State(state): State<Shared>,
    Path(user_id): Path<UserId>,
) -> Json<ModelSettings> {
    let state = state.lock().unwrap();
    let (provider, key) = state
        .settings
        .get(&user_id)
        .cloned()
        .unwrap_or_else(|| ("claude".to_string(), None));
    Json(ModelSettings {
        provider,
        has_api_key: key.is_some(),
        available_providers: providers(),
    })
}

async fn update_model_settings(
    State(state): State<Shared>,
    Path(user_id): Path<UserId>,
    Json(update): Json<ModelSettingsUpdate>,
) -> Result<Json<ModelSettingsAck>, ApiError> {
    let mut state = state.lock().unwrap();
    let stored_key = state.settings.get(&user_id).and_then(|(_, k)| k.clone());
    let key = update.api_key.or(stored_key);

    if update.provider == "groq" && key.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "GROQ API key is required" })),
        ));
    }

    state
        .settings
        .insert(user_id, (update.provider.clone(), key));
    Ok(Json(ModelSettingsAck {
        message: format!("Switched to {}", update.provider),
        provider: update.provider,
    }))
}

async fn user_stats(
    State(state): State<Shared>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserStats>, ApiError> {
    // Only the first user has played enough to have stats
    if user_id != 1 {
        return Err(not_found("Stats"));
    }
    let state = state.lock().unwrap();
    let user = state
        .users
        .iter()
        .find(|u| u.id == user_id)
        .ok_or_else(|| not_found("User"))?;
    Ok(Json(UserStats {
        user_id: Some(user.id),
        username: Some(user.username.clone()),
        total_xp: 1250,
        level: 3,
        level_title: "Apprentice".into(),
        current_xp: 250,
        xp_for_next_level: 500,
        progress_percent: 50.0,
        streak_days: 4,
    }))
}

async fn enhance_prompt(Json(request): Json<EnhancePrompt>) -> Json<EnhancedPrompt> {
    Json(EnhancedPrompt {
        enhanced: format!(
            "Explain {} step by step, with a small example for each step.",
            request.prompt
        ),
        original: Some(request.prompt),
    })
}
