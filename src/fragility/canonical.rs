//! Canonical JSON serialization for Fragility documents.
//!
//! Object keys are sorted lexicographically at every level and arrays keep
//! their original order, so two structurally identical documents produce
//! byte-identical canonical forms regardless of key order. The top-level
//! `checksum` field is excluded from the hashing form for the same reason
//! the Soul checksum is: a seal cannot cover itself.

use serde_json::Value;

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // serde_json string rendering gives exact JSON escaping.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        primitive => out.push_str(&primitive.to_string()),
    }
}

/// Deterministic serialization of any JSON value.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Canonical form used as the hashing input: the document with the
/// top-level `checksum` removed.
pub fn canonical_for_hash(value: &Value) -> String {
    match value {
        Value::Object(map) if map.contains_key("checksum") => {
            let mut trimmed = map.clone();
            trimmed.remove("checksum");
            canonical_json(&Value::Object(trimmed))
        }
        _ => canonical_json(value),
    }
}
