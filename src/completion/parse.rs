//! Extracting a [`CompletionResult`] from free-form model output.
//!
//! Models wrap JSON in prose or code fences, so parsing is two bounded passes:
//! 1. slice from the first `{` to the last `}` and deserialize;
//! 2. if that fails, deserialize the first complete JSON value starting at the
//!    first `{` and ignore whatever follows it.
//!
//! Blank action items are dropped afterwards. Nothing beyond these two passes
//! is attempted.

use tracing::debug;

use super::{CompletionError, CompletionResult};

pub fn parse_completion(raw: &str) -> Result<CompletionResult, CompletionError> {
    match parse_outer_slice(raw) {
        Ok(result) => Ok(result),
        Err(first) => {
            debug!("Outer JSON slice rejected ({}), trying leading value", first);
            parse_leading_value(raw).map_err(|second| {
                CompletionError::MalformedResponse(format!("{}; fallback: {}", first, second))
            })
        }
    }
}

fn parse_outer_slice(raw: &str) -> Result<CompletionResult, String> {
    let start = raw.find('{').ok_or("no JSON object in response")?;
    let end = raw.rfind('}').ok_or("no JSON object in response")?;
    if end < start {
        return Err("no JSON object in response".to_string());
    }

    serde_json::from_str(&raw[start..=end])
        .map(drop_blank_items)
        .map_err(|e| e.to_string())
}

fn parse_leading_value(raw: &str) -> Result<CompletionResult, String> {
    let start = raw.find('{').ok_or("no JSON object in response")?;

    let mut values = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<CompletionResult>();
    match values.next() {
        Some(Ok(result)) => Ok(drop_blank_items(result)),
        Some(Err(e)) => Err(e.to_string()),
        None => Err("no JSON value in response".to_string()),
    }
}

/// The shape is already enforced by deserialization. Items with blank text are
/// dropped so that one empty entry does not discard a usable summary.
fn drop_blank_items(mut result: CompletionResult) -> CompletionResult {
    let before = result.action_items.len();
    result
        .action_items
        .retain(|item| !item.text.trim().is_empty());

    let dropped = before - result.action_items.len();
    if dropped > 0 {
        debug!("Dropped {} blank action item(s) from completion", dropped);
    }
    result
}
