use serde_json::{Map, Value};
use std::borrow::Cow;

/// Recursively search a structured response for every value stored under `key`.
///
/// Device software versions disagree on how many `TABLE_*`/`ROW_*` wrapper
/// levels surround a row, so callers never index into a fixed path. Matches
/// nested under an entry's value are collected before the entry's own value.
/// With a `filter`, only scalar values whose text form equals it are kept.
///
/// Returns `None` when the key never matches.
pub fn find_key<'a>(value: &'a Value, key: &str, filter: Option<&str>) -> Option<Vec<&'a Value>> {
    let mut found = Vec::new();
    collect(value, key, filter, &mut found);
    if found.is_empty() {
        None
    } else {
        Some(found)
    }
}

fn collect<'a>(value: &'a Value, key: &str, filter: Option<&str>, found: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, key, filter, found);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                if v.is_array() || v.is_object() {
                    collect(v, key, filter, found);
                }
                if k == key && matches_filter(v, filter) {
                    found.push(v);
                }
            }
        }
        _ => {}
    }
}

fn matches_filter(value: &Value, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(expected) => scalar_text(value).is_some_and(|text| text == expected),
    }
}

/// Text form of a scalar value. Containers and `null` have none.
pub fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Flatten every row stored under a row-wrapper key into a list of mappings.
///
/// A wrapper holds a single mapping when the table has one row and a list of
/// mappings otherwise. Anything that is not a mapping is skipped.
pub fn rows<'a>(value: &'a Value, key: &str) -> Vec<&'a Map<String, Value>> {
    let mut out = Vec::new();
    for found in find_key(value, key, None).unwrap_or_default() {
        match found {
            Value::Object(row) => out.push(row),
            Value::Array(items) => out.extend(items.iter().filter_map(Value::as_object)),
            _ => {}
        }
    }
    out
}

/// Read a scalar field of a row as trimmed text.
pub fn field(row: &Map<String, Value>, key: &str) -> Option<String> {
    row.get(key)
        .and_then(scalar_text)
        .map(|text| text.trim().to_string())
}
