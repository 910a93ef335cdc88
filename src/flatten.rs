//! Flattening of nested metric documents
//!
//! Nested JSON objects are collapsed into a single level by joining the key path
//! with [`SEPARATOR`]. Any non-object value (numbers, strings, booleans, null and
//! arrays) is a leaf and kept as is. Empty objects contribute no keys.
//!
//! Keys are written in document order. When two distinct paths join to the same
//! name (`{"a_b": 1, "a": {"b": 2}}`), the one visited last wins.

use serde_json::{Map, Value};

/// Single-level metric mapping handed to the host agent.
pub type FlatMetrics = Map<String, Value>;

pub const SEPARATOR: &str = "_";

pub fn flatten(map: &Map<String, Value>) -> FlatMetrics {
    let mut out = FlatMetrics::new();
    flatten_into(map, None, &mut out);
    out
}

fn flatten_into(map: &Map<String, Value>, parent: Option<&str>, out: &mut FlatMetrics) {
    for (key, value) in map {
        let path = match parent {
            Some(parent) => format!("{parent}{SEPARATOR}{key}"),
            None => key.clone(),
        };

        match value {
            Value::Object(nested) => flatten_into(nested, Some(&path), out),
            leaf => {
                // remove first so the later write also takes the later position
                out.shift_remove(&path);
                out.insert(path, leaf.clone());
            }
        }
    }
}
