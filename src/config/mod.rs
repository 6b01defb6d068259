//! Application configuration

pub mod client;
pub mod prompts;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use client::{ClientConfig, ConfigError};
pub use prompts::{builtin as prompts_builtin, QuickPrompts};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_USER_ID: i64 = 1;
pub const DEFAULT_ROLLOVER_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub user_id: i64,
    pub rollover_delay_ms: u64,
    pub download_dir: PathBuf,
    pub prompts: QuickPrompts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_id: DEFAULT_USER_ID,
            rollover_delay_ms: DEFAULT_ROLLOVER_DELAY_MS,
            download_dir: PathBuf::from("."),
            prompts: QuickPrompts::default(),
        }
    }
}

impl Config {
    /// Defaults, then the optional file, then `TUTOR_*` environment variables
    pub fn from_env(file: Option<ClientConfig>) -> Result<Self, ConfigError> {
        Self::layered(file, |key| env::var(key).ok())
    }

    /// Same layering as [`Config::from_env`] with an injectable variable lookup
    pub fn layered<F>(file: Option<ClientConfig>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(file) = file {
            if let Some(url) = file.backend.url {
                config.api_url = url;
            }
            if let Some(id) = file.user.id {
                config.user_id = id;
            }
            if let Some(delay) = file.chat.rollover_delay_ms {
                config.rollover_delay_ms = delay;
            }
            if let Some(dir) = file.export.download_dir {
                config.download_dir = dir;
            }
            config.prompts = file.prompts;
        }

        if let Some(url) = lookup("TUTOR_API_URL") {
            config.api_url = url;
        }
        if let Some(raw) = lookup("TUTOR_USER_ID") {
            config.user_id = raw.parse().map_err(|_| {
                ConfigError::Validation(format!("TUTOR_USER_ID is not a number: '{}'", raw))
            })?;
        }
        if let Some(dir) = lookup("TUTOR_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        config.api_url = config.api_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn rollover_delay(&self) -> Duration {
        Duration::from_millis(self.rollover_delay_ms)
    }
}
