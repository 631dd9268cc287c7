//! Conversion between document subtrees and `serde_json` values.
//!
//! Object key order is kept in both directions (`serde_json` is built with
//! `preserve_order`). Numbers that hold an exact integer are written as JSON
//! integers, and negative zero is written as `0`.

use serde_json::{Map, Number};

use crate::error::{DocumentError, Result};
use crate::types::ValueType;
use crate::value::{Value, ValueMut};

/// Integers in `[-2^53, 2^53]` convert to and from `f64` exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

pub(crate) fn encode_value(value: Value<'_>) -> Result<serde_json::Value> {
    Ok(match value.value_type() {
        ValueType::Null => serde_json::Value::Null,
        ValueType::Bool => serde_json::Value::Bool(value.bool_get()?),
        ValueType::Number => serde_json::Value::Number(encode_number(value.number_get()?)?),
        ValueType::String => serde_json::Value::String(value.string_get()?.to_owned()),
        ValueType::Opaque => return Err(DocumentError::Unserializable(ValueType::Opaque)),
        ValueType::Array => serde_json::Value::Array(
            value
                .array_iter()?
                .map(encode_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        ValueType::Object => {
            let mut map = Map::with_capacity(value.object_len()?);
            for (key, child) in value.object_iter()? {
                map.insert(key.to_owned(), encode_value(child)?);
            }
            serde_json::Value::Object(map)
        }
    })
}

fn encode_number(n: f64) -> Result<Number> {
    if !n.is_finite() {
        return Err(DocumentError::NonFiniteNumber(n));
    }
    // Normalize -0 to 0
    let n = if n == 0.0 { 0.0 } else { n };
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        return Ok(Number::from(n as i64));
    }
    Number::from_f64(n).ok_or(DocumentError::NonFiniteNumber(n))
}

/// Rebuilds `target` from `json` through the recording setters.
pub(crate) fn decode_into(target: &mut ValueMut<'_>, json: &serde_json::Value) -> Result<()> {
    match json {
        serde_json::Value::Null => {
            target.initialize(ValueType::Null);
        }
        serde_json::Value::Bool(b) => {
            target.bool_set(*b);
        }
        serde_json::Value::Number(n) => {
            // as_f64 is always Some without arbitrary_precision
            target.number_set(n.as_f64().unwrap_or_default());
        }
        serde_json::Value::String(s) => {
            target.string_set(s);
        }
        serde_json::Value::Array(items) => {
            target.array_initialize(items.len());
            for item in items {
                decode_into(&mut target.array_append()?, item)?;
            }
        }
        serde_json::Value::Object(map) => {
            target.object_initialize(map.len());
            for (key, item) in map {
                decode_into(&mut target.object_set(key)?, item)?;
            }
        }
    }
    Ok(())
}
