//! Deterministic serialization of log details.
//!
//! Object keys are emitted in sorted order and no whitespace is written, so
//! the same `details` value always produces the same bytes regardless of
//! how the map was built or which serde_json features are enabled.

use serde_json::Value;

const DETAILS_DOMAIN: &[u8] = b"s3-log-details-v1:";

/// Canonical compact JSON bytes for `value`.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

/// BLAKE3 digest of the canonical form of `details`.
pub fn details_digest(details: &Value) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DETAILS_DOMAIN);
    hasher.update(&canonical_bytes(details));
    hasher.finalize()
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(Value::String(key.clone()).to_string().as_bytes());
                out.push(b':');
                write_canonical(&map[key], out);
            }
            out.push(b'}');
        }
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}
