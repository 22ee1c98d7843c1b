//! Caption-to-channel destination resolution.
//!
//! Strategies, in priority order:
//!
//! 1. native channel mention in the rich-text blocks,
//! 2. `<#CHANNEL_ID|name>` token in the caption text,
//! 3. normalized channel name contained in the normalized caption.
//!
//! Only the last strategy consults the channel directory.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::directory::ChannelDirectory;
use super::mention;
use super::normalize::normalize;
use crate::models::{Channel, InboundEvent, Resolution, ResolutionStrategy};

/// Maps an event's caption to a destination channel.
#[derive(Clone)]
pub struct DestinationResolver {
    directory: Arc<dyn ChannelDirectory>,
}

impl DestinationResolver {
    /// Create a resolver that fuzzy-matches against `directory`.
    #[must_use]
    pub fn new(directory: Arc<dyn ChannelDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve the destination for `event`.
    pub async fn resolve_event(&self, event: &InboundEvent) -> Resolution {
        self.resolve(&event.caption_text, event.raw_structured_mentions.as_ref())
            .await
    }

    /// Resolve a caption and optional rich-text blocks to a destination.
    ///
    /// Never fails: a directory error is logged and reported as
    /// [`Resolution::Unresolved`].
    pub async fn resolve(&self, caption: &str, structured: Option<&Value>) -> Resolution {
        if let Some(explicit) = resolve_explicit(caption, structured) {
            return explicit;
        }

        let normalized_caption = normalize(caption);
        if normalized_caption.is_empty() {
            debug!("empty caption; skipping directory lookup");
            return Resolution::Unresolved;
        }

        let channels = match self.directory.list_channels().await {
            Ok(channels) => channels,
            Err(err) => {
                warn!(%err, "channel directory unavailable; treating as unresolved");
                return Resolution::Unresolved;
            }
        };

        match match_channel_name(&normalized_caption, &channels) {
            Some(channel) => {
                info!(
                    channel_id = %channel.id,
                    channel_name = %channel.name,
                    "caption matched channel name"
                );
                Resolution::resolved(channel.id.clone(), ResolutionStrategy::NameMatch)
            }
            None => {
                info!(
                    %normalized_caption,
                    candidates = channels.len(),
                    "no channel name found in caption"
                );
                Resolution::Unresolved
            }
        }
    }
}

/// Resolve an explicit channel reference without touching the directory.
///
/// A structured mention takes precedence over a textual one.
#[must_use]
pub fn resolve_explicit(caption: &str, structured: Option<&Value>) -> Option<Resolution> {
    if let Some(id) = structured.and_then(mention::channel_from_blocks) {
        return Some(Resolution::resolved(id, ResolutionStrategy::StructuredMention));
    }
    mention::channel_from_text(caption)
        .map(|id| Resolution::resolved(id, ResolutionStrategy::TextMention))
}

/// Return the first channel, in listing order, whose normalized name occurs
/// in `normalized_caption`.
///
/// Channels whose name normalizes to an empty string never match.
// TODO: decide with the logistics team whether the longest matching name
// should win over listing order when several channels match.
#[must_use]
pub fn match_channel_name<'a>(
    normalized_caption: &str,
    channels: &'a [Channel],
) -> Option<&'a Channel> {
    channels.iter().find(|channel| {
        let name = normalize(&channel.name);
        !name.is_empty() && normalized_caption.contains(name.as_str())
    })
}
