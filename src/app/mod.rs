//! Application state and event handlers
//!
//! [`App`] owns everything the client knows: the current user, the
//! conversation list, the open conversation and whichever panel is showing.
//! Handlers mutate that state and hand back [`Effect`]s for the front end to
//! carry out; nothing here touches the terminal directly.
//!
//! Sending a message is split in three steps so a front end can keep taking
//! input while a request is in flight:
//!
//! 1. [`App::begin_send`] appends the user message and marks the
//!    conversation busy,
//! 2. [`PendingSend::run`] performs the request (no `&mut App` needed),
//! 3. [`App::finish_send`] appends the reply and clears the busy flag.
//!
//! [`App::send`] runs all three in sequence.

mod views;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::config::{prompts_builtin, Config, QuickPrompts};
use crate::conversation::{Conversation, ConversationId, Message, Role, Transcript};
use crate::effects::{Effect, PendingAction};
use crate::gateway::{
    Backend, GatewayError, ModelSettingsUpdate, NewConversation, SendMessageResponse, UserId,
    UserInfo,
};
use crate::protocol;
use crate::quiz::{AnswerOutcome, Progress, QuizError, QuizSession, QuizState, QuizSummary};
use crate::render::{self, CheatsheetCard, ResourcesCard, Widget};

pub use views::{category_icon, ProfileView, SettingsView, View};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Still waiting for the tutor to reply")]
    Busy,

    #[error("No conversation is open")]
    NoActiveConversation,

    #[error("There is no quiz in this conversation yet")]
    NoActiveQuiz,

    #[error("{0}")]
    Unavailable(&'static str),

    #[error("{0}")]
    Validation(String),
}

/// Canned prompts offered under the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    QuizMe,
    Cheatsheet,
    ExploreResources,
}

impl QuickAction {
    pub fn label(self) -> &'static str {
        match self {
            QuickAction::QuizMe => "Quiz Me!",
            QuickAction::Cheatsheet => "Cheatsheet",
            QuickAction::ExploreResources => "Explore Resources",
        }
    }

    pub fn prompt(self, prompts: &QuickPrompts) -> &str {
        match self {
            QuickAction::QuizMe => &prompts.quiz,
            QuickAction::Cheatsheet => &prompts.cheatsheet,
            QuickAction::ExploreResources => &prompts.resources,
        }
    }
}

/// A message accepted for sending but not yet delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub conversation_id: ConversationId,
    pub message: String,
}

impl PendingSend {
    pub async fn run(&self, backend: &dyn Backend) -> Result<SendMessageResponse, GatewayError> {
        tracing::debug!(conversation_id = self.conversation_id, "sending message");
        backend.send_message(self.conversation_id, &self.message).await
    }
}

/// What moving past an answered quiz question led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAdvance {
    Next(usize),
    /// The quiz ended; `report` carries the result to the conversation
    Finished {
        summary: QuizSummary,
        report: PendingSend,
    },
}

/// The open conversation and the interactive cards its replies produced
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Transcript,
    quiz: Option<QuizSession>,
    cheatsheet: Option<CheatsheetCard>,
    resources: Option<ResourcesCard>,
    draft: Option<String>,
}

impl ChatSession {
    fn new(transcript: Transcript) -> Self {
        let mut chat = Self {
            transcript,
            quiz: None,
            cheatsheet: None,
            resources: None,
            draft: None,
        };
        // Past quizzes were already answered; only pick up exportable cards
        let history: Vec<String> = chat
            .transcript
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.clone())
            .collect();
        for content in history {
            chat.absorb(&content, false);
        }
        chat
    }

    fn absorb(&mut self, content: &str, with_quiz: bool) {
        for widget in render::dispatch(&protocol::extract(content)) {
            match widget {
                Widget::Text(_) => {}
                Widget::Quiz(session) => {
                    if with_quiz {
                        self.quiz = Some(session);
                    }
                }
                Widget::Cheatsheet(card) => self.cheatsheet = Some(card),
                Widget::Resources(card) => self.resources = Some(card),
            }
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.transcript.conversation_id()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    pub fn cheatsheet(&self) -> Option<&CheatsheetCard> {
        self.cheatsheet.as_ref()
    }

    pub fn resources(&self) -> Option<&ResourcesCard> {
        self.resources.as_ref()
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }
}

pub struct App {
    backend: Arc<dyn Backend>,
    config: Config,
    user_id: UserId,
    users: Vec<UserInfo>,
    conversations: Vec<Conversation>,
    view: View,
    chat: Option<ChatSession>,
    in_flight: HashSet<ConversationId>,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, config: Config) -> Self {
        let user_id = config.user_id;
        Self {
            backend,
            config,
            user_id,
            users: Vec::new(),
            conversations: Vec::new(),
            view: View::Welcome,
            chat: None,
            in_flight: HashSet::new(),
        }
    }

    // ========== Accessors ==========

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn users(&self) -> &[UserInfo] {
        &self.users
    }

    /// The current user, named `User <id>` if the backend didn't list them
    pub fn current_user(&self) -> UserInfo {
        self.users
            .iter()
            .find(|u| u.id == self.user_id)
            .cloned()
            .unwrap_or_else(|| UserInfo {
                id: self.user_id,
                username: format!("User {}", self.user_id),
            })
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn chat(&self) -> Option<&ChatSession> {
        self.chat.as_ref()
    }

    pub fn active_conversation_id(&self) -> Option<ConversationId> {
        self.chat.as_ref().map(ChatSession::conversation_id)
    }

    /// A send is in flight for the open conversation
    pub fn is_busy(&self) -> bool {
        self.active_conversation_id()
            .is_some_and(|id| self.in_flight.contains(&id))
    }

    // ========== Conversations ==========

    /// Initial load: users and the current user's conversations
    pub async fn start(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let (users, conversations) = futures::join!(
            self.backend.list_users(),
            self.backend.list_conversations(self.user_id)
        );

        match users {
            Ok(users) => self.users = users,
            Err(e) => tracing::warn!("failed to fetch users: {}", e),
        }
        match conversations {
            Ok(conversations) => self.conversations = conversations,
            Err(e) => {
                tracing::error!("failed to fetch conversations: {}", e);
                effects.push(Effect::error(format!("Could not load conversations: {}", e)));
            }
        }
        effects
    }

    pub async fn refresh_conversations(&mut self) -> Result<(), AppError> {
        self.conversations = self.backend.list_conversations(self.user_id).await?;
        Ok(())
    }

    /// Create a conversation and open it
    pub async fn new_chat(&mut self, guest: bool) -> Result<ConversationId, AppError> {
        let request = NewConversation {
            title: if guest { "Guest Chat" } else { "New Chat" }.to_string(),
            user_id: self.user_id,
            is_guest_mode: guest,
        };
        let created = self.backend.create_conversation(&request).await?;
        tracing::info!(id = created.id, guest, "created conversation");

        self.conversations.insert(
            0,
            Conversation {
                id: created.id,
                title: created.title,
                created_at: Some(Utc::now()),
            },
        );
        self.open_conversation(created.id).await?;
        Ok(created.id)
    }

    /// Make `id` the active conversation and load its history.
    ///
    /// If the history can't be fetched the conversation still opens, empty,
    /// and the error is returned for display.
    pub async fn open_conversation(&mut self, id: ConversationId) -> Result<(), AppError> {
        self.view = View::Chat;
        match self.backend.list_messages(id).await {
            Ok(history) => {
                self.chat = Some(ChatSession::new(Transcript::from_history(id, history)));
                Ok(())
            }
            Err(e) => {
                tracing::error!(id, "failed to fetch messages: {}", e);
                self.chat = Some(ChatSession::new(Transcript::new(id)));
                Err(e.into())
            }
        }
    }

    pub async fn rename_conversation(
        &mut self,
        id: ConversationId,
        title: &str,
    ) -> Result<(), AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title cannot be empty".into()));
        }
        let renamed = self.backend.rename_conversation(id, title).await?;
        if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == renamed.id) {
            conv.title = renamed.title;
        }
        Ok(())
    }

    pub fn request_delete_conversation(&self, id: ConversationId) -> Effect {
        Effect::Confirm(PendingAction::DeleteConversation(id))
    }

    pub fn request_delete_all_conversations(&self) -> Effect {
        Effect::Confirm(PendingAction::DeleteAllConversations)
    }

    pub fn request_flush_memories(&self) -> Effect {
        Effect::Confirm(PendingAction::FlushMemories)
    }

    /// Run a destructive action the user has confirmed
    pub async fn confirm(&mut self, action: PendingAction) -> Result<Vec<Effect>, AppError> {
        match action {
            PendingAction::DeleteConversation(id) => {
                self.backend.delete_conversation(id).await?;
                tracing::info!(id, "deleted conversation");
                if self.active_conversation_id() == Some(id) {
                    self.close_chat();
                }
                self.conversations.retain(|c| c.id != id);
                self.refresh_after_delete().await;
                Ok(vec![Effect::Reload])
            }
            PendingAction::DeleteAllConversations => {
                let status = self.backend.delete_all_conversations(self.user_id).await?;
                tracing::info!(count = ?status.count, "deleted all conversations");
                self.close_chat();
                self.conversations.clear();
                self.refresh_after_delete().await;
                Ok(vec![Effect::Reload])
            }
            PendingAction::FlushMemories => {
                self.backend.flush_memories(self.user_id).await?;
                if let View::Profile(ref mut profile) = self.view {
                    profile.memories.clear();
                }
                Ok(vec![Effect::success("All memories have been cleared!")])
            }
        }
    }

    async fn refresh_after_delete(&mut self) {
        if let Err(e) = self.refresh_conversations().await {
            tracing::warn!("failed to refresh conversations: {}", e);
        }
    }

    fn close_chat(&mut self) {
        self.chat = None;
        if matches!(self.view, View::Chat) {
            self.view = View::Welcome;
        }
    }

    // ========== Messaging ==========

    /// Append `text` as a user message and mark the conversation busy
    pub fn begin_send(&mut self, text: &str) -> Result<PendingSend, AppError> {
        self.begin(Role::User, text)
    }

    /// Same as [`App::begin_send`] for a quick action's prompt
    pub fn quick_action(&mut self, action: QuickAction) -> Result<PendingSend, AppError> {
        let prompt = action.prompt(&self.config.prompts).to_string();
        self.begin(Role::User, &prompt)
    }

    fn begin(&mut self, role: Role, text: &str) -> Result<PendingSend, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message is empty".into()));
        }
        let chat = self.chat.as_mut().ok_or(AppError::NoActiveConversation)?;
        let conversation_id = chat.conversation_id();
        if self.in_flight.contains(&conversation_id) {
            return Err(AppError::Busy);
        }

        chat.transcript.push(Message {
            role,
            content: text.to_string(),
        });
        self.in_flight.insert(conversation_id);
        Ok(PendingSend {
            conversation_id,
            message: text.to_string(),
        })
    }

    /// Record the outcome of a send.
    ///
    /// Replies for a conversation that is no longer open are dropped.
    pub fn finish_send(
        &mut self,
        pending: PendingSend,
        result: Result<SendMessageResponse, GatewayError>,
    ) -> Vec<Effect> {
        self.in_flight.remove(&pending.conversation_id);
        let delay = self.config.rollover_delay();

        let Some(chat) = self
            .chat
            .as_mut()
            .filter(|c| c.conversation_id() == pending.conversation_id)
        else {
            tracing::warn!(
                conversation_id = pending.conversation_id,
                "reply arrived after leaving the conversation, dropping it"
            );
            return Vec::new();
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("error sending message: {}", e);
                chat.transcript.add_system(prompts_builtin::CONNECTION_ERROR);
                return Vec::new();
            }
        };

        let Some(new_id) = reply.new_conversation_id else {
            chat.absorb(&reply.response, true);
            chat.transcript.add_assistant(&reply.response);
            return Vec::new();
        };

        tracing::info!(
            from = pending.conversation_id,
            to = new_id,
            "conversation rolled over"
        );
        chat.transcript.add_system(&reply.response);
        if let Some(title) = reply.new_title {
            if !self.conversations.iter().any(|c| c.id == new_id) {
                self.conversations.insert(
                    0,
                    Conversation {
                        id: new_id,
                        title,
                        created_at: Some(Utc::now()),
                    },
                );
            }
        }
        vec![Effect::ScheduleRollover {
            conversation_id: new_id,
            after: delay,
        }]
    }

    /// Send and wait for the reply
    pub async fn send(&mut self, text: &str) -> Result<Vec<Effect>, AppError> {
        let pending = self.begin_send(text)?;
        let result = pending.run(self.backend.as_ref()).await;
        Ok(self.finish_send(pending, result))
    }

    /// Switch to the conversation a rollover produced
    pub async fn complete_rollover(&mut self, id: ConversationId) -> Result<(), AppError> {
        if let Err(e) = self.refresh_conversations().await {
            tracing::warn!("failed to refresh conversations after rollover: {}", e);
        }
        self.open_conversation(id).await
    }

    /// Wait out the rollover delay, then switch
    pub async fn follow_rollover(
        &mut self,
        id: ConversationId,
        after: Duration,
    ) -> Result<(), AppError> {
        tokio::time::sleep(after).await;
        self.complete_rollover(id).await
    }

    /// Ask the backend to rewrite a draft prompt; the result becomes the draft
    pub async fn enhance_prompt(&mut self, prompt: &str) -> Result<String, AppError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::Validation("Nothing to enhance".into()));
        }
        let enhanced = self.backend.enhance_prompt(prompt).await?.enhanced;
        if let Some(chat) = self.chat.as_mut() {
            chat.draft = Some(enhanced.clone());
        }
        Ok(enhanced)
    }

    pub fn take_draft(&mut self) -> Option<String> {
        self.chat.as_mut().and_then(|c| c.draft.take())
    }

    // ========== Quiz ==========

    fn quiz_mut(&mut self) -> Result<&mut QuizSession, AppError> {
        self.chat
            .as_mut()
            .ok_or(AppError::NoActiveConversation)?
            .quiz
            .as_mut()
            .ok_or(AppError::NoActiveQuiz)
    }

    /// Answer with the option at `index` (zero-based)
    pub fn answer(&mut self, index: usize) -> Result<AnswerOutcome, AppError> {
        Ok(self.quiz_mut()?.select_index(index)?)
    }

    /// Answer by option text, matched exactly
    pub fn answer_text(&mut self, option: &str) -> Result<AnswerOutcome, AppError> {
        Ok(self.quiz_mut()?.select(option)?)
    }

    pub fn hint(&mut self) -> Result<Option<String>, AppError> {
        Ok(self.quiz_mut()?.use_hint()?)
    }

    /// Move to the next question, or finish and report the result upstream.
    ///
    /// Finishing needs to send a message, so it is refused while another send
    /// is in flight; the quiz is left untouched and can be finished later.
    pub fn advance_quiz(&mut self) -> Result<QuizAdvance, AppError> {
        let busy = self.is_busy();
        let quiz = self.quiz_mut()?;
        if busy && quiz.is_last() && matches!(quiz.state(), QuizState::Answered { .. }) {
            return Err(AppError::Busy);
        }

        match quiz.advance()? {
            Progress::Next(index) => Ok(QuizAdvance::Next(index)),
            Progress::Finished(summary) => {
                let report = self.begin(Role::System, &summary.event_message())?;
                Ok(QuizAdvance::Finished { summary, report })
            }
        }
    }

    // ========== Cards ==========

    pub fn download_cheatsheet(&self) -> Result<Effect, AppError> {
        self.chat
            .as_ref()
            .and_then(ChatSession::cheatsheet)
            .map(CheatsheetCard::download)
            .ok_or(AppError::Unavailable("No cheatsheet in this conversation yet"))
    }

    pub fn print_cheatsheet(&self) -> Result<Effect, AppError> {
        self.chat
            .as_ref()
            .and_then(ChatSession::cheatsheet)
            .map(CheatsheetCard::print)
            .ok_or(AppError::Unavailable("No cheatsheet in this conversation yet"))
    }

    /// Open the resource at `index` (zero-based)
    pub fn open_resource(&self, index: usize) -> Result<Effect, AppError> {
        let card = self
            .chat
            .as_ref()
            .and_then(ChatSession::resources)
            .ok_or(AppError::Unavailable("No resources in this conversation yet"))?;
        card.open(index)
            .ok_or_else(|| AppError::Validation(format!("No resource #{}", index + 1)))
    }

    // ========== Users, profile, settings ==========

    pub async fn load_users(&mut self) -> Result<&[UserInfo], AppError> {
        self.users = self.backend.list_users().await?;
        Ok(&self.users)
    }

    pub async fn switch_user(&mut self, user_id: UserId) -> Result<(), AppError> {
        tracing::info!(user_id, "switching user");
        self.user_id = user_id;
        self.chat = None;
        self.view = View::Welcome;
        self.refresh_conversations().await
    }

    /// Show stats and memories for the current user
    pub async fn open_profile(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let (stats, memories) = futures::join!(
            self.backend.user_stats(self.user_id),
            self.backend.list_memories(self.user_id)
        );

        let stats = match stats {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("failed to fetch stats: {}", e);
                None
            }
        };
        let memories = match memories {
            Ok(memories) => memories,
            Err(e) => {
                tracing::error!("failed to fetch memories: {}", e);
                effects.push(Effect::error("Failed to load memories"));
                Vec::new()
            }
        };

        self.chat = None;
        self.view = View::Profile(ProfileView { stats, memories });
        effects
    }

    pub async fn open_settings(&mut self) -> Result<(), AppError> {
        let settings = self.backend.model_settings(self.user_id).await?;
        self.view = View::Settings(SettingsView::from(settings));
        Ok(())
    }

    /// Leave the profile or settings panel
    pub fn close_panel(&mut self) {
        self.view = if self.chat.is_some() {
            View::Chat
        } else {
            View::Welcome
        };
    }

    /// Switch the LLM provider used for this user
    pub async fn select_provider(
        &mut self,
        provider: &str,
        api_key: Option<&str>,
    ) -> Result<Effect, AppError> {
        let mut settings = match self.view {
            View::Settings(ref settings) => settings.clone(),
            _ => SettingsView::from(self.backend.model_settings(self.user_id).await?),
        };

        if !settings.providers.is_empty() && settings.find(provider).is_none() {
            return Err(AppError::Validation(format!("Unknown provider: {}", provider)));
        }
        if settings.missing_key(provider, api_key) {
            return Err(AppError::Validation(format!(
                "{} API key is required",
                provider.to_uppercase()
            )));
        }

        let update = ModelSettingsUpdate {
            provider: provider.to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        };
        let ack = self
            .backend
            .update_model_settings(self.user_id, &update)
            .await?;
        tracing::info!(provider = %ack.provider, "model provider switched");

        settings.provider = ack.provider;
        if update.api_key.is_some() {
            settings.has_api_key = true;
        }
        if matches!(self.view, View::Settings(_)) {
            self.view = View::Settings(settings);
        }
        Ok(Effect::success(format!("Switched to {}", provider)))
    }
}
