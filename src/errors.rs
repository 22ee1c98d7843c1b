//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all relay failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or credential lookup failure.
    Config(String),
    /// Slack Socket Mode or Web API failure.
    Slack(String),
    /// Channel directory listing or lookup failure.
    Directory(String),
    /// Attachment download failure (transport error or non-success status).
    Download(String),
    /// Attachment upload failure.
    Upload(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::Directory(msg) => write!(f, "directory: {msg}"),
            Self::Download(msg) => write!(f, "download: {msg}"),
            Self::Upload(msg) => write!(f, "upload: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Download(format!("request timed out: {err}"))
        } else {
            Self::Download(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
