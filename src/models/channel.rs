//! Channel directory entries.

use serde::{Deserialize, Serialize};

/// A channel as returned by the channel directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    /// Stable routing key.
    pub id: String,
    /// User-facing name, lowercase-with-separators by platform convention.
    pub name: String,
}

impl Channel {
    /// Construct a channel entry.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Descriptive information about a single channel, used for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDetails {
    /// Channel identifier.
    pub id: String,
    /// Channel name, when the platform reports one.
    pub name: Option<String>,
    /// Whether the channel is private.
    pub is_private: bool,
}
