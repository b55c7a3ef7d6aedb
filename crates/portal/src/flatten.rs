//! Flattening of nested search results into single-level records.
//!
//! Each requested field is a dotted path (`file_set.samples.accession`). The
//! walk descends one segment at a time: an object yields the named member, a
//! list maps the segment over its elements and flattens nested lists. The walk
//! stops early at a missing or empty value and records that value.

use serde_json::{Map, Value};

/// A flattened record keyed by dotted field path, in allowlist order.
pub type MetadataRecord = Map<String, Value>;

/// A parsed dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path.
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            segments: raw.split('.').map(str::to_string).collect(),
        }
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolve the path against one search result.
    pub fn resolve(&self, data: &Value) -> Value {
        walk(data, &self.segments)
    }
}

/// Flatten one search result over a field allowlist.
///
/// # Arguments
/// * `data` - One element of a search `@graph`
/// * `fields` - Parsed field paths
///
/// # Returns
/// A record with exactly one entry per field. Missing values are `null`.
pub fn flatten_record(data: &Value, fields: &[FieldPath]) -> MetadataRecord {
    fields
        .iter()
        .map(|field| (field.as_str().to_string(), field.resolve(data)))
        .collect()
}

fn walk(value: &Value, segments: &[String]) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return value.clone();
    };

    let next: Value = match value {
        Value::Object(map) => map.get(head).cloned().unwrap_or(Value::Null),
        Value::Array(items) => {
            let mut collected: Vec<Value> = Vec::new();
            for item in items {
                let member: Value = item.get(head.as_str()).cloned().unwrap_or(Value::Null);
                flatten_into(member, &mut collected);
            }
            Value::Array(collected)
        }
        _ => Value::Null,
    };

    if is_empty(&next) {
        return next;
    }
    walk(&next, rest)
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        other => out.push(other),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
