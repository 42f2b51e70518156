//! Lenient field decoders for snapshot records.
//!
//! Records come from other clients' partial syncs, so `null` or mistyped optional
//! fields decode to their default instead of rejecting the whole blob.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::RecordId;

fn as_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
}

/// `null`/missing/non-string -> empty string
pub fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// `null`/non-string -> `None`
pub fn optional_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Display sort key: `null`/non-number -> 0
pub fn order<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(Value::deserialize(de)?.as_f64().unwrap_or(0.0))
}

/// Foreign key: anything but an integer -> `None`
pub fn optional_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<RecordId>, D::Error> {
    Ok(as_id(&Value::deserialize(de)?))
}

/// Id list: non-array -> empty, non-integer entries dropped
pub fn id_list<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<RecordId>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => items.iter().filter_map(as_id).collect(),
        _ => Vec::new(),
    })
}
