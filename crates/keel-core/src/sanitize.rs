//! Input sanitization for request-derived values
//!
//! Strings are trimmed, NFC-normalized and HTML-escaped before they are handed to handlers or
//! written into diagnostic logs.

use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Trim, NFC-normalize and HTML-escape a single string
pub fn sanitize_str(value: &str) -> String {
    let trimmed = value.trim();
    let mut escaped = String::with_capacity(trimmed.len());

    for ch in trimmed.nfc() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            other => escaped.push(other),
        }
    }

    escaped
}

/// Recursively sanitize every string inside a JSON value
///
/// Object keys are left untouched; numbers, booleans and nulls pass through.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, sanitize_value(v))).collect()),
        other => other,
    }
}
