//! Profile and settings panels

use crate::gateway::{Memory, ModelSettings, ProviderInfo, UserStats};

/// What the main area shows
#[derive(Debug, Clone, Default)]
pub enum View {
    /// No conversation selected
    #[default]
    Welcome,
    Chat,
    Profile(ProfileView),
    Settings(SettingsView),
}

#[derive(Debug, Clone, Default)]
pub struct ProfileView {
    /// `None` when the backend has no stats for this user
    pub stats: Option<UserStats>,
    pub memories: Vec<Memory>,
}

impl ProfileView {
    pub fn has_streak(&self) -> bool {
        self.stats.as_ref().is_some_and(|s| s.streak_days > 0)
    }
}

/// Icon shown next to a memory of the given category
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "user_profile" => "👤",
        "learning_preference" => "📚",
        _ => "💭",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsView {
    pub provider: String,
    pub has_api_key: bool,
    pub providers: Vec<ProviderInfo>,
}

impl From<ModelSettings> for SettingsView {
    fn from(settings: ModelSettings) -> Self {
        Self {
            provider: settings.provider,
            has_api_key: settings.has_api_key,
            providers: settings.available_providers,
        }
    }
}

impl SettingsView {
    pub fn find(&self, provider: &str) -> Option<&ProviderInfo> {
        self.providers.iter().find(|p| p.id == provider)
    }

    /// Switching to `provider` needs a key we don't have
    pub fn missing_key(&self, provider: &str, api_key: Option<&str>) -> bool {
        let requires_key = self.find(provider).is_some_and(|p| p.requires_key);
        let key_given = api_key.is_some_and(|k| !k.trim().is_empty());
        requires_key && !key_given && !self.has_api_key
    }
}
