//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which Slack tokens are stored.
pub const KEYRING_SERVICE: &str = "logistics-relay";

/// Upper bound Slack accepts for `conversations.list` page sizes.
const MAX_PAGE_SIZE: u16 = 1000;

/// Nested Slack configuration for Socket Mode connectivity.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// never from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// The logistics channel the bot monitors for forwardable images.
    pub source_channel_id: String,
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for Web API calls and file downloads (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

/// Destination resolution and event handling settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RoutingConfig {
    /// Channels requested per `conversations.list` page.
    #[serde(default = "default_channel_page_size")]
    pub channel_page_size: u16,
    /// Pages fetched per listing; channels beyond this bound are invisible
    /// to name matching.
    #[serde(default = "default_max_channel_pages")]
    pub max_channel_pages: u32,
    /// How long a directory listing is reused; 0 lists on every event.
    #[serde(default)]
    pub directory_cache_ttl_seconds: u64,
    /// Number of recently seen events remembered for redelivery detection.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            channel_page_size: default_channel_page_size(),
            max_channel_pages: default_max_channel_pages(),
            directory_cache_ttl_seconds: 0,
            dedup_capacity: default_dedup_capacity(),
        }
    }
}

/// File download and upload settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TransferConfig {
    /// Timeout applied to every outbound HTTP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Upload filename used when an attachment has neither name nor title.
    #[serde(default = "default_filename")]
    pub default_filename: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            default_filename: default_filename(),
        }
    }
}

fn default_channel_page_size() -> u16 {
    500
}

fn default_max_channel_pages() -> u32 {
    1
}

fn default_dedup_capacity() -> usize {
    1024
}

fn default_request_timeout() -> u64 {
    30
}

fn default_filename() -> String {
    "image.jpg".into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Slack connectivity settings.
    pub slack: SlackConfig,
    /// Destination resolution settings.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Download and upload settings.
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `logistics-relay` keyring service first, then falls
    /// back to `SLACK_APP_TOKEN` / `SLACK_BOT_TOKEN` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required tokens.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        Ok(())
    }

    /// Timeout applied to every outbound network call.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer.request_timeout_seconds)
    }

    /// Directory cache lifetime, or `None` when caching is disabled.
    #[must_use]
    pub fn directory_cache_ttl(&self) -> Option<Duration> {
        match self.routing.directory_cache_ttl_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.slack.source_channel_id.trim().is_empty() {
            return Err(AppError::Config(
                "slack.source_channel_id must not be empty".into(),
            ));
        }

        if self.routing.channel_page_size == 0 || self.routing.channel_page_size > MAX_PAGE_SIZE {
            return Err(AppError::Config(format!(
                "routing.channel_page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        if self.routing.max_channel_pages == 0 {
            return Err(AppError::Config(
                "routing.max_channel_pages must be greater than zero".into(),
            ));
        }

        if self.routing.dedup_capacity == 0 {
            return Err(AppError::Config(
                "routing.dedup_capacity must be greater than zero".into(),
            ));
        }

        if self.transfer.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "transfer.request_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.transfer.default_filename.trim().is_empty() {
            return Err(AppError::Config(
                "transfer.default_filename must not be empty".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(AppError::Config(format!(
            "credential {keyring_key} is empty in {env_key} env var"
        ))),
        Err(_) => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
