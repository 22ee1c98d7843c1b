//! Event eligibility filter.
//!
//! Rejection rules are applied in order and the first match wins:
//!
//! 1. the message was not posted in the logistics channel,
//! 2. the message was posted by a bot (prevents forwarding loops),
//! 3. the message has no attachments.
//!
//! The filter is a pure predicate. Evaluating an event any number of times
//! always yields the same decision.

use std::fmt::{Display, Formatter};

use crate::models::InboundEvent;

/// Why an event was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Posted outside the configured source channel.
    ForeignChannel,
    /// Posted by a bot or integration.
    BotMessage,
    /// Carries no files.
    NoAttachments,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ForeignChannel => "not the logistics channel",
            Self::BotMessage => "bot message",
            Self::NoAttachments => "no attachments",
        };
        f.write_str(label)
    }
}

/// Decides whether an inbound event proceeds to destination resolution.
#[derive(Debug, Clone)]
pub struct EventFilter {
    source_channel_id: String,
}

impl EventFilter {
    /// Create a filter that only admits events from `source_channel_id`.
    #[must_use]
    pub fn new(source_channel_id: impl Into<String>) -> Self {
        Self {
            source_channel_id: source_channel_id.into(),
        }
    }

    /// The channel this filter admits events from.
    #[must_use]
    pub fn source_channel_id(&self) -> &str {
        &self.source_channel_id
    }

    /// Evaluate the rejection rules against `event`.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] of the first rule that rejects the event.
    pub fn evaluate(&self, event: &InboundEvent) -> Result<(), SkipReason> {
        if event.source_channel_id != self.source_channel_id {
            return Err(SkipReason::ForeignChannel);
        }
        if event.is_bot_message() {
            return Err(SkipReason::BotMessage);
        }
        if event.attachments.is_empty() {
            return Err(SkipReason::NoAttachments);
        }
        Ok(())
    }

    /// Whether `event` passes every rule.
    #[must_use]
    pub fn should_forward(&self, event: &InboundEvent) -> bool {
        self.evaluate(event).is_ok()
    }
}
