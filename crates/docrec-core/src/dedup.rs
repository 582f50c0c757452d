//! Record deduplication.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::record::{is_internal, Record};

/// Decimal places kept for floats when building keys.
const FLOAT_KEY_PRECISION: usize = 6;

/// Which of several duplicate records survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepPolicy {
    /// Keep the earliest occurrence.
    #[default]
    First,
    /// Keep the latest occurrence, at the position of the earliest.
    Last,
}

/// Remove duplicate records.
///
/// The key is built from `key_columns` when given, otherwise from every
/// non-internal field sorted by name, so `_source_file` and friends never
/// make two otherwise identical records distinct.
pub fn dedup(records: Vec<Record>, key_columns: &[String], keep: KeepPolicy) -> Vec<Record> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<Record> = Vec::with_capacity(records.len());

    for record in records {
        let key = record_key(&record, key_columns);
        match positions.get(&key) {
            Some(&idx) => {
                if keep == KeepPolicy::Last {
                    out[idx] = record;
                }
            }
            None => {
                positions.insert(key, out.len());
                out.push(record);
            }
        }
    }

    out
}

/// Canonical key of a record.
pub fn record_key(record: &Record, key_columns: &[String]) -> String {
    let parts: Vec<String> = if key_columns.is_empty() {
        let mut fields: Vec<(&String, &Value)> =
            record.iter().filter(|(k, _)| !is_internal(k)).collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
            .into_iter()
            .map(|(k, v)| format!("{:?}={}", k, canonical(v)))
            .collect()
    } else {
        key_columns
            .iter()
            .map(|k| canonical(record.get(k).unwrap_or(&Value::Null)))
            .collect()
    };

    // unit separator; rendered strings escape it
    parts.join("\u{1f}")
}

/// Render a value for key comparison with floats at fixed precision.
fn canonical(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format!("{:.*}", FLOAT_KEY_PRECISION, f),
            None => n.to_string(),
        },
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let inner: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{:?}:{}", k, canonical(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        other => other.to_string(),
    }
}
