//! Per-event relay pipeline: filter, deduplicate, resolve, forward.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use super::dedup::EventDeduplicator;
use super::directory::{CachedDirectory, ChannelDirectory};
use super::filter::{EventFilter, SkipReason};
use super::forwarder::{FileTransfer, ForwardReport, Forwarder};
use super::resolver::DestinationResolver;
use crate::config::GlobalConfig;
use crate::models::{InboundEvent, Resolution};

/// What happened to an inbound event.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Rejected by the event filter.
    Skipped(SkipReason),
    /// Already processed under an earlier delivery.
    Duplicate,
    /// No usable destination (none found, or the source channel itself);
    /// nothing was forwarded.
    Unresolved,
    /// Image attachments were processed against a destination.
    Forwarded {
        /// Destination channel identifier.
        destination: String,
        /// Per-attachment results.
        report: ForwardReport,
    },
}

/// Composes the routing components into a single event handler.
///
/// Each call to [`RelayPipeline::handle`] runs to completion before
/// returning, so attachments of one event are never interleaved.
pub struct RelayPipeline {
    filter: EventFilter,
    dedup: EventDeduplicator,
    resolver: DestinationResolver,
    forwarder: Forwarder,
    directory: Arc<dyn ChannelDirectory>,
}

impl RelayPipeline {
    /// Build a pipeline from configuration and platform collaborators.
    ///
    /// When `routing.directory_cache_ttl_seconds` is non-zero the directory
    /// is wrapped in a [`CachedDirectory`].
    #[must_use]
    pub fn new(
        config: &GlobalConfig,
        directory: Arc<dyn ChannelDirectory>,
        transfer: Arc<dyn FileTransfer>,
    ) -> Self {
        let directory: Arc<dyn ChannelDirectory> = match config.directory_cache_ttl() {
            Some(ttl) => Arc::new(CachedDirectory::new(directory, ttl)),
            None => directory,
        };

        Self {
            filter: EventFilter::new(config.slack.source_channel_id.clone()),
            dedup: EventDeduplicator::new(config.routing.dedup_capacity),
            resolver: DestinationResolver::new(Arc::clone(&directory)),
            forwarder: Forwarder::new(transfer, config.transfer.default_filename.clone()),
            directory,
        }
    }

    /// Process a single inbound event.
    pub async fn handle(&self, event: &InboundEvent) -> RelayOutcome {
        let span = info_span!(
            "relay_event",
            channel = %event.source_channel_id,
            subtype = ?event.subtype,
            ts = ?event.ts,
        );
        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: &InboundEvent) -> RelayOutcome {
        if let Err(reason) = self.filter.evaluate(event) {
            debug!(%reason, "skip event");
            return RelayOutcome::Skipped(reason);
        }

        if !self.dedup.first_delivery(event) {
            info!("skip event: already processed");
            return RelayOutcome::Duplicate;
        }

        info!(
            files_count = event.attachments.len(),
            raw_text = %event.caption_text,
            "processing event"
        );

        let destination = match self.resolver.resolve_event(event).await {
            Resolution::Resolved {
                channel_id,
                strategy,
            } => {
                info!(destination = %channel_id, %strategy, "resolved destination");
                channel_id
            }
            Resolution::Unresolved => {
                info!("skip event: no destination channel found in text or blocks");
                return RelayOutcome::Unresolved;
            }
        };

        // Never upload into the channel being listened to.
        if destination == self.filter.source_channel_id() {
            warn!(%destination, "skip event: destination is the source channel");
            return RelayOutcome::Unresolved;
        }

        let report = self.forwarder.forward(event, &destination).await;
        info!(
            %destination,
            forwarded = report.forwarded.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "event forwarded"
        );

        self.log_destination(&destination).await;

        RelayOutcome::Forwarded {
            destination,
            report,
        }
    }

    async fn log_destination(&self, destination: &str) {
        match self.directory.describe(destination).await {
            Ok(details) => info!(
                destination,
                destination_name = ?details.name,
                is_private = details.is_private,
                "destination details"
            ),
            Err(err) => warn!(destination, %err, "destination lookup failed"),
        }
    }
}
