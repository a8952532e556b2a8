//! Index-key limits
//!
//! Every indexed field value is written as the left-hand side of a
//! `key=<ids>` line, so the key text must fit on one line, must not contain
//! the separator, and is capped in length.

use crate::error::{Error, Result};
use crate::value::Value;

/// Maximum key length in bytes
pub const MAX_KEY_BYTES: usize = 256;

/// Separator between key and id array in a key-file line
pub const KEY_SEPARATOR: char = '=';

/// Key text for `value`, or `None` when the value is not indexed
///
/// Null values are not indexed.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] if the value is not scalar or is a
/// non-finite float, or if its text breaks a [`validate_key`] rule.
pub fn normalize_key(value: &Value) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    if let Value::Float(f) = value {
        if !f.is_finite() {
            return Err(Error::InvalidKey(format!("{} cannot be used as a key", f)));
        }
    }
    let key = value.index_key().ok_or_else(|| {
        Error::InvalidKey(format!("{} cannot be used as a key", value.type_name()))
    })?;
    validate_key(&key)?;
    Ok(Some(key))
}

/// Check key text against the limits
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] describing the first violated rule.
pub fn validate_key(key: &str) -> Result<()> {
    if key.len() > MAX_KEY_BYTES {
        return Err(Error::InvalidKey(format!(
            "key is {} bytes, maximum is {}",
            key.len(),
            MAX_KEY_BYTES
        )));
    }
    if key.contains(KEY_SEPARATOR) {
        return Err(Error::InvalidKey(format!(
            "key must not contain '{}'",
            KEY_SEPARATOR
        )));
    }
    if key.contains(['\n', '\r']) {
        return Err(Error::InvalidKey("key must not contain line breaks".to_string()));
    }
    Ok(())
}
