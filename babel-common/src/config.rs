//! Configuration for the Babel relay.
//!
//! Values come from `~/.babel/config.json` (or the file named by `BABEL_CONFIG`)
//! and are then overridden by environment variables. The bot token is the only
//! required setting and is normally supplied through `TELEGRAM_BOT_TOKEN`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Environment variable holding the bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".babel"),
        |dirs| dirs.home_dir().join(".babel"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    std::env::var_os("BABEL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("config.json"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub translator: TranslatorConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// File the values were read from; `None` when running on defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Telegram transport configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Prefer `TELEGRAM_BOT_TOKEN` over storing it on disk.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Usernames or numeric ids allowed to talk to the bot; `"*"` allows everyone.
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Long-poll timeout passed to `getUpdates`
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

// Keeps the token out of debug logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "***"))
            .field("allowed_users", &self.allowed_users)
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_users: default_allowed_users(),
            api_base: default_telegram_api_base(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_allowed_users() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

/// Translation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Provider base URL
    #[serde(default = "default_translator_endpoint")]
    pub endpoint: String,

    /// Upper bound on a single translation call
    #[serde(default = "default_translator_timeout")]
    pub timeout_secs: u64,

    /// Longest text the provider accepts
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translator_endpoint(),
            timeout_secs: default_translator_timeout(),
            max_chars: default_max_chars(),
        }
    }
}

fn default_translator_endpoint() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_translator_timeout() -> u64 {
    10
}

fn default_max_chars() -> usize {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load configuration, apply environment overrides, and validate.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply process environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (the process environment in production).
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(BOT_TOKEN_ENV) {
            self.telegram.bot_token = Some(token);
        }

        if let Some(level) = lookup("BABEL_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("BABEL_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        if let Some(endpoint) = lookup("BABEL_TRANSLATOR_ENDPOINT") {
            self.translator.endpoint = endpoint;
        }
        if let Some(timeout) = lookup("BABEL_TRANSLATOR_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.translator.timeout_secs = secs;
            }
        }
    }

    /// Check required settings.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.bot_token().is_none() {
            return Err(Error::ConfigurationMissing(BOT_TOKEN_ENV.to_string()));
        }
        if self.translator.timeout_secs == 0 {
            return Err(Error::Config(
                "translator.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The bot token, if present and non-blank.
    pub fn bot_token(&self) -> Option<&str> {
        self.telegram
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
