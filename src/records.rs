//! Decoding fetched JSON payloads into typed records.
//!
//! Sources hand back either a bare JSON array or an envelope object around
//! one. Recognised envelopes:
//!
//! | Key | Producer |
//! |-----|----------|
//! | `results` | Etsy Open API v3 (`{count, results}`) |
//! | `documents` | Firestore exports / list responses |
//! | `data` | generic REST backends |
//!
//! Records that fail to decode are skipped with a warning rather than
//! failing the whole fetch.

use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

const ENVELOPE_KEYS: [&str; 3] = ["results", "documents", "data"];

/// Extract the record array from a payload.
pub fn unwrap_envelope(payload: Value) -> Result<Vec<Value>> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                match map.remove(key) {
                    Some(Value::Array(items)) => return Ok(items),
                    // Firestore omits `documents` on an empty collection; `null` means the same.
                    Some(Value::Null) => return Ok(Vec::new()),
                    Some(_) => bail!("'{}' is not an array", key),
                    None => {}
                }
            }
            if map.is_empty() {
                return Ok(Vec::new());
            }
            bail!(
                "expected a JSON array or an object with one of {:?}",
                ENVELOPE_KEYS
            )
        }
        Value::Null => Ok(Vec::new()),
        _ => bail!("expected a JSON array or an object with one of {:?}", ENVELOPE_KEYS),
    }
}

/// Decode each item, skipping (and logging) the ones that don't fit `T`.
pub fn decode_records<T: DeserializeOwned>(source: &str, items: Vec<Value>) -> Vec<T> {
    let total = items.len();
    let mut out = Vec::with_capacity(total);
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => out.push(record),
            Err(e) => tracing::warn!(source, index = i, error = %e, "skipping malformed record"),
        }
    }
    if out.len() < total {
        tracing::warn!(source, skipped = total - out.len(), total, "some records were skipped");
    }
    out
}

/// [`unwrap_envelope`] followed by [`decode_records`].
pub fn decode_payload<T: DeserializeOwned>(source: &str, payload: Value) -> Result<Vec<T>> {
    Ok(decode_records(source, unwrap_envelope(payload)?))
}
