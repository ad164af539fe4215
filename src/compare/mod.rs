//! Cross-switch comparison of a structured command's top-level fields.

use serde_json::{Map, Value};
use std::fmt::Write;

use crate::models::nxos_key;
use crate::search::scalar_text;
use crate::transport::{DeviceQuery, QueryError};

pub const DEFAULT_COMMAND: &str = "show version";

const MISSING: &str = "-";

/// SwitchSnapshot is one switch's top-level answer to the compared command
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSnapshot {
    pub label: String,
    pub fields: Map<String, Value>,
}

impl SwitchSnapshot {
    pub fn new(fallback_label: &str, doc: Value) -> Self {
        let fields = match doc {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        let label = fields
            .get(nxos_key::HOST_NAME)
            .and_then(scalar_text)
            .map(|s| s.into_owned())
            .unwrap_or_else(|| fallback_label.to_string());
        Self { label, fields }
    }

    fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(scalar_text).map(|s| s.into_owned())
    }
}

pub async fn snapshot(
    device: &dyn DeviceQuery,
    fallback_label: &str,
    command: &str,
) -> Result<SwitchSnapshot, QueryError> {
    let doc = device.structured_query(command).await?;
    Ok(SwitchSnapshot::new(fallback_label, doc))
}

/// Mismatch is a top-level key whose value differs from the first switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub key: String,
    /// One value per switch, `-` where the switch lacks the key
    pub values: Vec<String>,
}

/// Scalar keys of the first snapshot that differ on any other snapshot.
/// A key missing on another switch is not a mismatch by itself.
pub fn mismatches(snapshots: &[SwitchSnapshot]) -> Vec<Mismatch> {
    let Some((first, rest)) = snapshots.split_first() else {
        return Vec::new();
    };

    first
        .fields
        .iter()
        .filter_map(|(key, value)| {
            let reference = scalar_text(value)?.into_owned();
            let others: Vec<Option<String>> = rest.iter().map(|s| s.text(key)).collect();
            let differs = others
                .iter()
                .any(|other| other.as_ref().is_some_and(|o| *o != reference));
            if !differs {
                return None;
            }
            let mut values = vec![reference];
            values.extend(others.into_iter().map(|o| o.unwrap_or_else(|| MISSING.to_string())));
            Some(Mismatch { key: key.clone(), values })
        })
        .collect()
}

/// Fixed-width table: key column then one column per switch
pub fn render_table(snapshots: &[SwitchSnapshot], mismatches: &[Mismatch]) -> String {
    let mut out = String::new();
    write_row(&mut out, "", snapshots.iter().map(|s| s.label.as_str()));
    for mismatch in mismatches {
        write_row(&mut out, &mismatch.key, mismatch.values.iter().map(String::as_str));
    }
    out
}

fn write_row<'a>(out: &mut String, first: &str, cells: impl Iterator<Item = &'a str>) {
    let _ = write!(out, "{:>45}", first);
    for cell in cells {
        let _ = write!(out, "{:>45}", cell);
    }
    out.push('\n');
}
