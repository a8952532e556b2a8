//! JSON formatter.
//!
//! The reference [`Formatter`]: record bodies become JSON objects in field
//! order, index id-arrays become compact JSON arrays. Compact output never
//! contains a raw newline, so encoded arrays are safe on a key-file line.

use flatstore_core::{Error, Fields, Formatter, Result, Value};

/// JSON formatter backed by `serde_json`.
///
/// # Example
///
/// ```
/// use flatstore_core::{Formatter, Value};
/// use flatstore_storage::codec::JsonFormatter;
///
/// let json = JsonFormatter;
/// let ids = Value::Array(vec![Value::from("2026101600000001")]);
///
/// let encoded = json.encode(&ids).unwrap();
/// assert_eq!(encoded, br#"["2026101600000001"]"#);
/// assert_eq!(json.decode(&encoded).unwrap(), ids);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn formatter_id(&self) -> &str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Fields::new()));
        }
        serde_json::from_slice(bytes).map_err(Error::from)
    }

    fn merge(&self, base: &Value, other: &Value) -> Value {
        match (base, other) {
            (Value::Object(a), Value::Object(b)) => {
                let mut merged = a.clone();
                for (name, value) in b.iter() {
                    let next = match merged.get(name) {
                        Some(existing) => self.merge(existing, value),
                        None => value.clone(),
                    };
                    merged.insert(name, next);
                }
                Value::Object(merged)
            }
            (Value::Array(a), Value::Array(b)) => {
                Value::Array(a.iter().chain(b.iter()).cloned().collect())
            }
            (Value::Array(a), v) => {
                let mut items = a.clone();
                items.push(v.clone());
                Value::Array(items)
            }
            (v, Value::Array(b)) => {
                let mut items = Vec::with_capacity(b.len() + 1);
                items.push(v.clone());
                items.extend(b.iter().cloned());
                Value::Array(items)
            }
            (a, b) => Value::Array(vec![a.clone(), b.clone()]),
        }
    }
}
