//! Client configuration loaded from TOML files
//!
//! Every section is optional; missing values fall back to the built-in
//! defaults and can still be overridden by the environment or CLI flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::prompts::QuickPrompts;

/// Root client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Tutor backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Which backend user this client acts as
    #[serde(default)]
    pub user: UserConfig,

    /// Chat behaviour
    #[serde(default)]
    pub chat: ChatConfig,

    /// Cheatsheet export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Quick-action prompt overrides
    #[serde(default)]
    pub prompts: QuickPrompts,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.backend.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "backend.url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        Ok(())
    }
}

/// Tutor backend connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. http://localhost:8000
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Backend user id
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Delay before switching to a rolled-over conversation
    #[serde(default)]
    pub rollover_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory cheatsheets are downloaded into
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
