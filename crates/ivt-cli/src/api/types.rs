//! Listing response decoding
//!
//! The store answers a listing call with either a bare JSON array of records
//! or an object wrapping them under `items`.

use ivt_common::{IdentifierPolicy, StoredRecord};
use serde_json::Value;
use tracing::warn;

/// Decode a listing body into stored records
///
/// Unexpected shapes yield an empty listing; entries that are not JSON
/// objects are skipped.
pub fn parse_listing(body: &Value, policy: &IdentifierPolicy) -> Vec<StoredRecord> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(object) => match object.get("items") {
            Some(Value::Array(entries)) => entries,
            _ => {
                warn!(
                    keys = ?object.keys().collect::<Vec<_>>(),
                    "Listing object has no 'items' array, treating as empty"
                );
                return Vec::new();
            },
        },
        other => {
            warn!(kind = json_kind(other), "Unexpected listing format, treating as empty");
            return Vec::new();
        },
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let stored = StoredRecord::from_json(entry, policy);
            if stored.is_none() {
                warn!(position, kind = json_kind(entry), "Skipping non-object listing entry");
            }
            stored
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
