//! Record schemas
//!
//! A [`Schema`] is the static description of one record type: table name,
//! primary-key field, optional field-name prefix and the ordered field list.
//! Schemas are declared once per type and never change at runtime.
//!
//! ```
//! use flatstore_core::{FieldInfo, FieldType, Schema};
//!
//! let schema = Schema::new("User", "id")
//!     .prefix("usr_")
//!     .field(FieldInfo::new("email", FieldType::String).unique())
//!     .field(FieldInfo::new("age", FieldType::Integer).indexed());
//!
//! assert_eq!(schema.indexed_fields().count(), 2);
//! assert_eq!(schema.strip_prefix("usr_email"), "email");
//! ```

use std::fmt;

use crate::validate::Validator;

/// Declared type of a field
///
/// Metadata only: values are not coerced to the declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Text
    String,
    /// Whole number
    Integer,
    /// Floating point number
    Float,
    /// true/false
    Boolean,
    /// Any storable value
    Any,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Any => "any",
        };
        f.write_str(name)
    }
}

/// Metadata for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// Field name, unprefixed
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
    /// Maintain a key file for this field
    pub indexed: bool,
    /// At most one record per key
    pub unique: bool,
    /// Optional value constraint
    pub validator: Option<Validator>,
}

impl FieldInfo {
    /// Plain, non-indexed field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            indexed: false,
            unique: false,
            validator: None,
        }
    }

    /// Maintain a key file for this field
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Unique index (implies `indexed`)
    pub fn unique(mut self) -> Self {
        self.indexed = true;
        self.unique = true;
        self
    }

    /// Attach a validator
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// Static description of a record type
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    primary_key: String,
    prefix: Option<String>,
    fields: Vec<FieldInfo>,
}

impl Schema {
    /// Schema for table `name` keyed by `primary_key`
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            prefix: None,
            fields: Vec::new(),
        }
    }

    /// Set the field-name prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Declare a field; redeclaring a name replaces it in place
    pub fn field(mut self, info: FieldInfo) -> Self {
        match self.fields.iter_mut().find(|f| f.name == info.name) {
            Some(existing) => *existing = info,
            None => self.fields.push(info),
        }
        self
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary-key field name, unprefixed
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Field-name prefix, if any
    pub fn field_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Metadata for `name` (prefixed or not)
    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        let name = self.strip_prefix(name);
        self.fields.iter().find(|f| f.name == name)
    }

    /// All declared fields in declaration order
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Fields that maintain a key file
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| f.indexed)
    }

    /// Whether `name` may be assigned on a record of this type
    pub fn accepts(&self, name: &str) -> bool {
        let name = self.strip_prefix(name);
        name == self.primary_key || self.fields.iter().any(|f| f.name == name)
    }

    /// Remove the prefix from `name` if it carries it
    pub fn strip_prefix<'a>(&self, name: &'a str) -> &'a str {
        match &self.prefix {
            Some(p) => name.strip_prefix(p.as_str()).unwrap_or(name),
            None => name,
        }
    }

    /// Add the prefix to `name` unless it already carries it
    pub fn with_prefix(&self, name: &str) -> String {
        match &self.prefix {
            Some(p) if !name.starts_with(p.as_str()) => format!("{}{}", p, name),
            _ => name.to_string(),
        }
    }
}
