//! Inbound message event and attachment models.
//!
//! An [`InboundEvent`] is a platform-neutral snapshot of a single message
//! delivered by the event source. The Slack adapter builds one per push
//! event; the routing pipeline only ever reads it.

use serde::{Deserialize, Serialize};

/// Message subtype Slack assigns to messages posted by bots and integrations.
pub const BOT_MESSAGE_SUBTYPE: &str = "bot_message";

/// Mime type prefix that marks an attachment as forwardable.
const IMAGE_MIME_PREFIX: &str = "image/";

/// A file attached to an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    /// Platform file identifier.
    pub id: String,
    /// File name, or title when the platform supplies no name.
    pub display_name: Option<String>,
    /// Reported mime type; absent for some legacy uploads.
    pub mime_type: Option<String>,
    /// Authenticated URL the file bytes are fetched from.
    pub download_url: Option<String>,
}

impl Attachment {
    /// Whether this attachment is an image and therefore eligible for forwarding.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with(IMAGE_MIME_PREFIX))
    }

    /// Filename used for the re-upload, falling back to `default` when the
    /// attachment has no usable name.
    #[must_use]
    pub fn upload_filename<'a>(&'a self, default: &'a str) -> &'a str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(default)
    }
}

/// A message event observed in a channel the bot is a member of.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InboundEvent {
    /// Channel the message was posted in.
    pub source_channel_id: String,
    /// Message subtype (`file_share`, `bot_message`, ...), if any.
    pub subtype: Option<String>,
    /// Bot identifier when the message was posted by a bot, including
    /// file shares completed by this relay.
    pub bot_id: Option<String>,
    /// Free-text caption; empty when the message has no text.
    pub caption_text: String,
    /// Attached files in posting order.
    pub attachments: Vec<Attachment>,
    /// Rich-text `blocks` payload that may carry native channel mentions.
    pub raw_structured_mentions: Option<serde_json::Value>,
    /// Message timestamp, unique per channel.
    pub ts: Option<String>,
    /// Delivery envelope identifier.
    pub event_id: Option<String>,
}

impl InboundEvent {
    /// Whether the message was posted by a bot or integration.
    ///
    /// Bot file shares arrive with a `file_share` subtype, so the `bot_id`
    /// is checked as well as the subtype.
    #[must_use]
    pub fn is_bot_message(&self) -> bool {
        self.subtype.as_deref() == Some(BOT_MESSAGE_SUBTYPE) || self.bot_id.is_some()
    }

    /// Key identifying this logical message across redeliveries.
    ///
    /// Prefers `channel:ts`, which stays stable when the platform re-sends
    /// the same message under a new envelope; falls back to the envelope id.
    #[must_use]
    pub fn dedup_key(&self) -> Option<String> {
        match (&self.ts, &self.event_id) {
            (Some(ts), _) => Some(format!("{}:{ts}", self.source_channel_id)),
            (None, Some(event_id)) => Some(event_id.clone()),
            (None, None) => None,
        }
    }

    /// Iterate over the attachments eligible for forwarding.
    pub fn image_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_image())
    }
}
