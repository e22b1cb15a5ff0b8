//! Scrub JSON values before they are persisted.
//!
//! Postgres `jsonb` rejects `\u0000` and some drivers choke on raw control
//! characters. Everything written to storage goes through [`sanitize_value`].

use serde_json::{Map, Value};

/// True for characters that must not reach storage.
///
/// Tab, newline and carriage return are kept.
fn is_stripped(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        c => c.is_control(),
    }
}

/// Remove NUL, C0/C1 controls (except tab/newline/CR) and DEL.
///
/// Idempotent: `sanitize_text(&sanitize_text(s)) == sanitize_text(s)`.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    if !text.chars().any(is_stripped) {
        return text.to_string();
    }
    text.chars().filter(|&c| !is_stripped(c)).collect()
}

/// Recursively sanitize every string value and object key.
///
/// Numbers, booleans and nulls pass through untouched. When two keys collapse
/// to the same sanitized key the later one wins.
#[must_use]
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => {
            let mut clean = Map::with_capacity(map.len());
            for (key, item) in map {
                clean.insert(sanitize_text(&key), sanitize_value(item));
            }
            Value::Object(clean)
        }
        other => other,
    }
}
