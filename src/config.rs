use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::prompt::Verbosity;

// -----------------------------------------------------------------------------
// Config (root)
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path);
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        serde_saphyr::from_str(&contents).map_err(ConfigError::Yaml)
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let contents = serde_saphyr::to_string(self)?;
        fs::write(path, contents).map_err(ConfigError::Io)
    }
}

// -----------------------------------------------------------------------------
// ServerConfig
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8788
}

fn default_request_timeout() -> u64 {
    300
}

// -----------------------------------------------------------------------------
// ChatSettings
// -----------------------------------------------------------------------------

/// User-facing settings read by the session controller.
///
/// The controller re-reads these at the start of every summarize call, so
/// changes made mid-session take effect on the next operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub verbosity: Verbosity,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            verbosity: Verbosity::default(),
            theme: Theme::default(),
        }
    }
}

impl ChatSettings {
    /// Fall back to the `GEMINI_API_KEY` environment variable when the
    /// settings file carries no key.
    pub fn apply_env(&mut self) {
        if self.api_key.is_empty() {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                self.api_key = key;
            }
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

// -----------------------------------------------------------------------------
// SettingsStore
// -----------------------------------------------------------------------------

/// Shared handle to the live chat settings.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<RwLock<ChatSettings>>,
}

impl SettingsStore {
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Snapshot of the current settings.
    pub async fn snapshot(&self) -> ChatSettings {
        self.inner.read().await.clone()
    }

    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ChatSettings),
    {
        let mut settings = self.inner.write().await;
        f(&mut settings);
    }
}

// -----------------------------------------------------------------------------
// ConfigError
// -----------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(serde_saphyr::Error),

    #[error("failed to serialize config: {0}")]
    YamlSerialize(#[from] serde_saphyr::ser::Error),
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
