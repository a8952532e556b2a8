//! Field validators
//!
//! A [`FieldInfo`](crate::FieldInfo) may carry a [`Validator`]; `Record::set`
//! runs it against every non-null value before accepting the assignment.

use crate::value::{parse_number, Value};

/// Shape constraint for string fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// ASCII letters and digits only
    Alphanumeric,
    /// `local@domain.tld`
    Email,
}

/// Value constraint attached to a field
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// String constraints
    String {
        /// Minimum length in chars
        min_len: Option<usize>,
        /// Maximum length in chars
        max_len: Option<usize>,
        /// Required shape
        kind: Option<StringKind>,
        /// Reject anything but strings
        strict: bool,
    },
    /// Numeric constraints
    Number {
        /// Inclusive lower bound
        min: Option<f64>,
        /// Inclusive upper bound
        max: Option<f64>,
        /// `Some(true)` requires an integer, `Some(false)` forbids one
        integer: Option<bool>,
        /// Maximum number of decimal digits
        precision: Option<u32>,
    },
}

impl Validator {
    /// Unconstrained string validator
    pub fn string() -> Self {
        Validator::String {
            min_len: None,
            max_len: None,
            kind: None,
            strict: false,
        }
    }

    /// Unconstrained number validator
    pub fn number() -> Self {
        Validator::Number {
            min: None,
            max: None,
            integer: None,
            precision: None,
        }
    }

    /// Set length bounds (string validators only)
    pub fn length(mut self, min: usize, max: usize) -> Self {
        if let Validator::String {
            min_len, max_len, ..
        } = &mut self
        {
            *min_len = Some(min);
            *max_len = Some(max);
        }
        self
    }

    /// Require a shape (string validators only)
    pub fn is(mut self, what: StringKind) -> Self {
        if let Validator::String { kind, .. } = &mut self {
            *kind = Some(what);
        }
        self
    }

    /// Only accept `Value::String` (string validators only)
    pub fn strict(mut self) -> Self {
        if let Validator::String { strict, .. } = &mut self {
            *strict = true;
        }
        self
    }

    /// Set inclusive bounds (number validators only)
    pub fn range(mut self, lo: f64, hi: f64) -> Self {
        if let Validator::Number { min, max, .. } = &mut self {
            *min = Some(lo);
            *max = Some(hi);
        }
        self
    }

    /// Require (`true`) or forbid (`false`) integers (number validators only)
    pub fn integer(mut self, required: bool) -> Self {
        if let Validator::Number { integer, .. } = &mut self {
            *integer = Some(required);
        }
        self
    }

    /// Cap decimal digits (number validators only)
    pub fn precision(mut self, digits: u32) -> Self {
        if let Validator::Number { precision, .. } = &mut self {
            *precision = Some(digits);
        }
        self
    }

    /// Check `value`, returning the reason on failure
    ///
    /// Null always passes; whether a field may be null is not a validator concern.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Validator::String {
                min_len,
                max_len,
                kind,
                strict,
            } => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    _ if *strict => {
                        return Err(format!("expected a string, got {}", value.type_name()))
                    }
                    other => other
                        .index_key()
                        .ok_or_else(|| format!("expected a scalar, got {}", other.type_name()))?,
                };

                let len = text.chars().count();
                if min_len.map_or(false, |min| len < min) || max_len.map_or(false, |max| len > max)
                {
                    return Err(format!(
                        "length {} outside {}..={}",
                        len,
                        min_len.unwrap_or(0),
                        max_len.map_or("∞".to_string(), |m| m.to_string())
                    ));
                }

                match kind {
                    Some(StringKind::Alphanumeric)
                        if !text.chars().all(|c| c.is_ascii_alphanumeric()) =>
                    {
                        Err("must be alphanumeric".to_string())
                    }
                    Some(StringKind::Email) if !looks_like_email(&text) => {
                        Err("must be an email address".to_string())
                    }
                    _ => Ok(()),
                }
            }
            Validator::Number {
                min,
                max,
                integer,
                precision,
            } => {
                let number = value
                    .as_number()
                    .ok_or_else(|| format!("expected a number, got {}", value.type_name()))?;

                if let Some(digits) = precision {
                    if decimal_digits(value) > *digits as usize {
                        return Err(format!("more than {} decimal digits", digits));
                    }
                }

                if min.map_or(false, |lo| number < lo) || max.map_or(false, |hi| number > hi) {
                    return Err(format!("{} out of range", number));
                }

                let is_int = matches!(value, Value::Int(_))
                    || matches!(value, Value::String(s) if s.trim().parse::<i64>().is_ok());
                match integer {
                    Some(true) if !is_int => Err("must be an integer".to_string()),
                    Some(false) if is_int => Err("must not be an integer".to_string()),
                    _ => Ok(()),
                }
            }
        }
    }
}

fn decimal_digits(value: &Value) -> usize {
    let text = match value {
        Value::String(s) if parse_number(s).is_some() => s.trim().to_string(),
        other => other.index_key().unwrap_or_default(),
    };
    text.rsplit_once('.').map_or(0, |(_, frac)| frac.len())
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}
