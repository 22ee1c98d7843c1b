//! Socket Mode push-event handler.
//!
//! Only `message` events are relayed. Slack delivers file shares as
//! `message` events with a `file_share` subtype, so a single handler
//! covers both plain and file-share messages and each logical message
//! reaches the pipeline exactly once per delivery.
//!
//! The typed `slack-morphism` event is converted through its JSON wire
//! form. That keeps the conversion aligned with Slack's field names
//! (`url_private_download`, `mimetype`, rich-text `blocks`) and lets the
//! raw blocks travel into the resolver untouched.

use std::sync::Arc;

use serde_json::Value;
use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackPushEventCallback,
};
use tracing::{debug, info, warn};

use crate::models::{Attachment, InboundEvent};
use crate::routing::{RelayOutcome, RelayPipeline};

/// Handle push events delivered via Socket Mode.
///
/// # Errors
///
/// Never returns an error: per-event failures are logged so the listener
/// keeps running.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let pipeline: Option<Arc<RelayPipeline>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<RelayPipeline>>().cloned()
    };

    let Some(pipeline) = pipeline else {
        warn!("relay pipeline not available; dropping push event");
        return Ok(());
    };

    let SlackEventCallbackBody::Message(message) = &event.event else {
        debug!("non-message push event ignored");
        return Ok(());
    };

    let wire = match serde_json::to_value(message) {
        Ok(wire) => wire,
        Err(err) => {
            warn!(%err, "failed to read message event payload");
            return Ok(());
        }
    };

    let event_id = event.event_id.to_string();
    let Some(inbound) = inbound_from_message(&wire, Some(&event_id)) else {
        debug!(%event_id, "message event without channel ignored");
        return Ok(());
    };

    info!(
        %event_id,
        subtype = ?inbound.subtype,
        channel = %inbound.source_channel_id,
        ts = ?inbound.ts,
        "incoming message event"
    );

    match pipeline.handle(&inbound).await {
        RelayOutcome::Forwarded {
            destination,
            report,
        } if !report.is_complete() => {
            warn!(
                %event_id,
                %destination,
                failed = report.failures.len(),
                "event forwarded with failures"
            );
        }
        outcome => debug!(%event_id, ?outcome, "event handled"),
    }

    Ok(())
}

/// Build an [`InboundEvent`] from a Slack `message` event in wire form.
///
/// Returns `None` when the payload carries no channel.
#[must_use]
pub fn inbound_from_message(message: &Value, event_id: Option<&str>) -> Option<InboundEvent> {
    let source_channel_id = str_field(message, "channel")?;

    let attachments = message
        .get("files")
        .and_then(Value::as_array)
        .map(|files| files.iter().filter_map(attachment_from_file).collect())
        .unwrap_or_default();

    let blocks = message
        .get("blocks")
        .filter(|blocks| blocks.as_array().is_some_and(|b| !b.is_empty()))
        .cloned();

    Some(InboundEvent {
        source_channel_id,
        subtype: str_field(message, "subtype"),
        bot_id: str_field(message, "bot_id"),
        caption_text: str_field(message, "text").unwrap_or_default(),
        attachments,
        raw_structured_mentions: blocks,
        ts: str_field(message, "ts"),
        event_id: event_id.map(str::to_owned),
    })
}

fn attachment_from_file(file: &Value) -> Option<Attachment> {
    let id = str_field(file, "id")?;
    Some(Attachment {
        id,
        display_name: str_field(file, "name").or_else(|| str_field(file, "title")),
        mime_type: str_field(file, "mimetype"),
        download_url: str_field(file, "url_private_download")
            .or_else(|| str_field(file, "url_private")),
    })
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
