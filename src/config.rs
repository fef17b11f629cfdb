//! Configuration loader and validator for the homework bot.
//!
//! Values come from an optional YAML file and are then overridden by the
//! environment (`PRACTICUM_TOKEN`, `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`).
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use teloxide::types::Recipient;
use thiserror::Error;

use crate::api::PRACTICUM_ENDPOINT;
use crate::detector::CompareBy;
use crate::notifier::parse_recipient;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub const ENV_PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub practicum: Practicum,
    pub telegram: Telegram,
    pub detector: Detector,
}

/// Review API settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Practicum {
    pub token: String,
    pub endpoint: String,
}

impl Default for Practicum {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: PRACTICUM_ENDPOINT.to_string(),
        }
    }
}

/// Telegram bot settings.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Telegram {
    pub bot_token: String,
    #[serde(deserialize_with = "string_or_int")]
    pub chat_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Detector {
    pub compare_by: CompareBy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("practicum.endpoint", &self.practicum.endpoint)
            .field("telegram.chat_id", &self.telegram.chat_id)
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Overwrite file values with any non-empty environment values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = get(ENV_PRACTICUM_TOKEN) {
            self.practicum.token = token;
        }
        if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = get(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = chat_id;
        }
    }

    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        Url::parse(self.practicum.endpoint.trim())
            .map_err(|_| ConfigError::Invalid("practicum.endpoint must be a valid URL"))
    }

    pub fn recipient(&self) -> Result<Recipient, ConfigError> {
        parse_recipient(&self.telegram.chat_id).ok_or(ConfigError::Invalid(
            "telegram.chat_id must be a chat id or an @channel username",
        ))
    }
}

/// Load configuration from `path` (default `config.yaml`) and the process
/// environment. A missing file is not an error.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load`] with an explicit environment lookup.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    let mut cfg = match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Config::default(),
        Ok(content) => serde_yaml::from_str(&content)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => Config::default(),
        Err(err) => return Err(err.into()),
    };
    cfg.apply_env(lookup);
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let missing: Vec<&'static str> = [
        (ENV_PRACTICUM_TOKEN, &cfg.practicum.token),
        (ENV_TELEGRAM_TOKEN, &cfg.telegram.bot_token),
        (ENV_TELEGRAM_CHAT_ID, &cfg.telegram.chat_id),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();
    if !missing.is_empty() {
        return Err(ConfigError::Missing(missing));
    }
    cfg.recipient()?;
    cfg.endpoint()?;
    Ok(())
}

fn string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n.to_string(),
        Raw::Str(s) => s,
    })
}

/// Example YAML accepted by [`load`].
pub fn example() -> &'static str {
    r#"practicum:
  token: "YOUR_PRACTICUM_OAUTH_TOKEN"
  endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/"

telegram:
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  chat_id: 123456789

detector:
  compare_by: status
"#
}
