//! Structured response resolver.
//!
//! Converts an arbitrary, possibly non-conforming text completion into a
//! guaranteed-valid [`StructuredPlan`]. This is a total function: callers
//! never see a parse error and always receive all five schema keys.
//!
//! Two-path design:
//! - **Repair on partial match** — the completion contains a JSON object:
//!   take each key that is present with the expected type, substitute the
//!   documented default for the rest, ignore unknown keys.
//! - **Verbatim fallback on total failure** — nothing parses: the raw text
//!   becomes the `message` and every list is empty, preserving user-visible
//!   content over strict schema compliance.

use learnmate_core::StructuredPlan;
use serde_json::{Map, Value};
use tracing::debug;

/// Message used when not even raw text could be recovered.
pub const FALLBACK_MESSAGE: &str =
    "I'm sorry, I couldn't put together a proper reply. Could you try rephrasing that?";

const LIST_KEYS: [&str; 4] = ["checklist", "roadmap", "schedule", "resources"];

/// Resolve a raw completion into a schema-complete plan. Never fails.
pub fn resolve(raw: &str) -> StructuredPlan {
    let trimmed = raw.trim();

    if let Some(obj) = find_plan_object(trimmed) {
        return plan_from_object(&obj);
    }

    debug!("Completion did not parse as structured data, degrading to verbatim message");
    if trimmed.is_empty() {
        StructuredPlan::message_only(FALLBACK_MESSAGE)
    } else {
        StructuredPlan::message_only(trimmed)
    }
}

/// Decode the conversational message of a stored completion, if it was a
/// plan object carrying a string `message`. Used by history reconstruction:
/// anything else replays verbatim, so the fallback string can never be
/// invented into history.
pub fn decode_message(raw: &str) -> Option<String> {
    let obj = find_plan_object(raw.trim())?;
    obj.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Locate and parse the JSON object inside a completion.
///
/// Tries, in order: the whole text, the body of a single outer code fence
/// (both markers must be present), and the first-`{`-to-last-`}` span. The
/// span heuristic additionally requires at least one known schema key, so a
/// brace pair buried in prose is not mistaken for a plan.
fn find_plan_object(text: &str) -> Option<Map<String, Value>> {
    if let Some(obj) = parse_object(text) {
        return Some(obj);
    }

    if let Some(body) = strip_outer_fence(text) {
        if let Some(obj) = parse_object(body) {
            return Some(obj);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    parse_object(&text[start..=end])
        .filter(|obj| obj.contains_key("message") || LIST_KEYS.iter().any(|k| obj.contains_key(*k)))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Strip one outer fence pair: a leading ``` (with optional language tag)
/// and a trailing ```. Returns None unless both markers are present.
fn strip_outer_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let (_, body) = rest.split_once('\n')?;
    let body = body.trim_end();
    let body = body.strip_suffix("```")?;
    Some(body.trim())
}

/// Build a plan from a parsed object, repairing per key.
fn plan_from_object(obj: &Map<String, Value>) -> StructuredPlan {
    StructuredPlan {
        message: obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        checklist: string_list(obj, "checklist"),
        roadmap: string_list(obj, "roadmap"),
        schedule: string_list(obj, "schedule"),
        resources: string_list(obj, "resources"),
    }
}

/// A list key counts only when every element is a string; any other shape
/// substitutes the default empty list.
fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<String>>>()
        })
        .unwrap_or_default()
}
