//! Explicit channel reference extraction.
//!
//! Slack encodes a channel mention two ways: as a `<#C123|name>` token in
//! the message text, and as a `{"type": "channel", "channel_id": ...}`
//! element inside a rich-text block. The block form is unambiguous, so
//! callers check it first.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

#[allow(clippy::expect_used)] // Literal pattern.
static TEXT_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<#([A-Z0-9]+)(?:\|[^>]+)?>").expect("channel mention pattern is valid")
});

/// Extract the first `<#CHANNEL_ID>` or `<#CHANNEL_ID|display-name>` token.
#[must_use]
pub fn channel_from_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    TEXT_MENTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Extract the first native channel mention from a rich-text `blocks` array.
///
/// Walks `blocks[*].elements[*].elements[*]` and returns the `channel_id`
/// of the first element whose `type` is `"channel"`. Anything that does not
/// have that shape is ignored.
#[must_use]
pub fn channel_from_blocks(blocks: &Value) -> Option<String> {
    let blocks = blocks.as_array()?;
    blocks
        .iter()
        .flat_map(|block| children(block, "elements"))
        .flat_map(|section| children(section, "elements"))
        .find_map(|element| {
            if element.get("type").and_then(Value::as_str) != Some("channel") {
                return None;
            }
            element
                .get("channel_id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_owned)
        })
}

fn children<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}
