//! Channel-name normalization shared by captions and directory entries.

/// Normalize a channel name or caption for substring matching.
///
/// Lowercases, turns spaces and underscores into hyphens, collapses hyphen
/// runs into a single hyphen, and trims hyphens from both ends. The result
/// is stable under repeated application, so
/// `normalize(&normalize(s)) == normalize(s)` for every input.
///
/// ```
/// use logistics_relay::routing::normalize::normalize;
///
/// assert_eq!(normalize("Warehouse Team"), "warehouse-team");
/// assert_eq!(normalize("a__b"), "a-b");
/// assert_eq!(normalize("--lead--"), "lead");
/// ```
#[must_use]
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars().flat_map(char::to_lowercase) {
        let ch = match ch {
            ' ' | '_' => '-',
            other => other,
        };
        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('-').to_owned()
}
