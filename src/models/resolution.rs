//! Destination resolution result.

use std::fmt::{Display, Formatter};

/// Which strategy produced a resolved destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Native channel mention embedded in the message's rich-text blocks.
    StructuredMention,
    /// `<#CHANNEL_ID>` or `<#CHANNEL_ID|name>` token in the caption text.
    TextMention,
    /// Normalized channel name found inside the normalized caption.
    NameMatch,
}

impl Display for ResolutionStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::StructuredMention => "structured_mention",
            Self::TextMention => "text_mention",
            Self::NameMatch => "name_match",
        };
        f.write_str(label)
    }
}

/// Outcome of resolving an event's destination channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A destination channel was found.
    Resolved {
        /// Destination channel identifier.
        channel_id: String,
        /// Strategy that produced the match.
        strategy: ResolutionStrategy,
    },
    /// No destination could be determined; nothing is forwarded.
    Unresolved,
}

impl Resolution {
    /// Build a resolved result.
    #[must_use]
    pub fn resolved(channel_id: impl Into<String>, strategy: ResolutionStrategy) -> Self {
        Self::Resolved {
            channel_id: channel_id.into(),
            strategy,
        }
    }

    /// Destination channel id, if resolved.
    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::Resolved { channel_id, .. } => Some(channel_id),
            Self::Unresolved => None,
        }
    }

    /// Whether a destination was found.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}
