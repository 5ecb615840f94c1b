//! Pulling a JSON object out of free-text model replies, and lenient field access.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, SbError};

/// First `{` through last `}`, across newlines.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

/// Extract and parse the JSON object embedded in a model reply.
///
/// Falls back to parsing the whole reply when no braces are found.
pub fn extract_json(reply: &str) -> Result<Value> {
    let candidate = JSON_OBJECT
        .find(reply)
        .map_or(reply, |found| found.as_str());
    serde_json::from_str(candidate).map_err(|err| SbError::AgentParse(err.to_string()))
}

/// Numeric field, accepting numbers or numeric strings.
pub(crate) fn number(raw: &Value, key: &str, default: f64) -> f64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(default),
        _ => default,
    }
}

pub(crate) fn score(raw: &Value, key: &str, default: f64) -> f64 {
    clamp_percent(number(raw, key, default))
}

pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) }
}

/// String field; non-string scalars are rendered, missing or null gives `default`.
pub(crate) fn text(raw: &Value, key: &str, default: &str) -> String {
    raw.get(key)
        .and_then(render)
        .unwrap_or_else(|| default.to_string())
}

/// List of strings. A bare string becomes a one-element list.
pub(crate) fn list(raw: &Value, key: &str) -> Vec<String> {
    match raw.get(key) {
        Some(value) => as_list(value),
        None => Vec::new(),
    }
}

pub(crate) fn as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(render).collect(),
        Value::Null => Vec::new(),
        other => render(other).into_iter().collect(),
    }
}

/// Array of records; elements that don't fit `T` are dropped.
pub(crate) fn records<T: DeserializeOwned>(raw: &Value, key: &str) -> Vec<T> {
    raw.get(key).map(as_records).unwrap_or_default()
}

pub(crate) fn as_records<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
