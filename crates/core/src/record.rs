//! Schema-bound records
//!
//! A record type is any type implementing [`RecordType`]; [`Record<T>`] holds
//! one instance's field values. All accessors are prefix-aware: `usr_email`
//! and `email` address the same field when the schema prefix is `usr_`.
//!
//! A record is *persisted* once its primary-key field holds a value. The storage
//! engine assigns the key on first save and clears it on remove; in between
//! the key cannot be reassigned.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::fields::Fields;
use crate::schema::{FieldInfo, Schema};
use crate::value::Value;

/// A type of record, identified by its static schema
///
/// ```
/// use flatstore_core::{FieldInfo, FieldType, RecordType, Schema};
/// use once_cell::sync::Lazy;
///
/// struct User;
///
/// static USER: Lazy<Schema> = Lazy::new(|| {
///     Schema::new("User", "id").field(FieldInfo::new("email", FieldType::String).unique())
/// });
///
/// impl RecordType for User {
///     fn schema() -> &'static Schema {
///         &USER
///     }
/// }
/// ```
pub trait RecordType: 'static {
    /// Schema shared by every record of this type
    fn schema() -> &'static Schema;
}

/// One record of type `T`
pub struct Record<T: RecordType> {
    data: Fields,
    _type: PhantomData<fn() -> T>,
}

impl<T: RecordType> Record<T> {
    /// Empty record
    pub fn new() -> Self {
        Self {
            data: Fields::new(),
            _type: PhantomData,
        }
    }

    /// Record populated from `fields`, each assignment validated by [`set`](Self::set)
    pub fn from_fields<K, V, I>(fields: I) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = Self::new();
        for (k, v) in fields {
            record.set(k.as_ref(), v)?;
        }
        Ok(record)
    }

    /// Record carrying only its primary key, ready to be loaded
    pub fn with_primary_key(id: impl Into<String>) -> Self {
        let mut record = Self::new();
        record
            .data
            .insert(T::schema().primary_key(), Value::String(id.into()));
        record
    }

    /// Value of `field`, or `None` when unset
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(T::schema().strip_prefix(field))
    }

    /// Assign `value` to `field`
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaViolation`] if the field is neither the primary
    /// key nor declared in the schema, if the value is not a storable scalar
    /// or null, if the field's validator rejects it, or if it would change the
    /// primary key of a persisted record.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let schema = T::schema();
        let field = schema.strip_prefix(field);
        let value = value.into();

        if !value.is_storable() {
            let reason = match &value {
                Value::Float(f) => format!("{} has no stored form", f),
                other => format!("must be scalar or null, {} given", other.type_name()),
            };
            return Err(Error::schema_violation(field, reason));
        }

        if field == schema.primary_key() {
            if let Some(current) = self.primary_key() {
                if value.index_key().as_deref() != Some(current.as_str()) {
                    return Err(Error::schema_violation(
                        field,
                        format!("record {} is persisted, its key cannot change", current),
                    ));
                }
            }
        } else {
            let info = schema.get(field).ok_or_else(|| {
                Error::schema_violation(field, format!("not declared in schema {}", schema.name()))
            })?;
            if let Some(validator) = &info.validator {
                validator
                    .check(&value)
                    .map_err(|reason| Error::schema_violation(field, reason))?;
            }
        }

        self.data.insert(field, value);
        Ok(())
    }

    /// Whether `field` holds a non-null value
    pub fn has(&self, field: &str) -> bool {
        self.get(field).map_or(false, |v| !v.is_null())
    }

    /// Remove `field`, returning its value
    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.data.remove(T::schema().strip_prefix(field))
    }

    /// Primary-key value as text, if set
    pub fn primary_key(&self) -> Option<String> {
        self.data
            .get(T::schema().primary_key())
            .and_then(Value::index_key)
    }

    /// True iff the primary key holds a value
    pub fn is_persisted(&self) -> bool {
        self.primary_key().is_some()
    }

    /// Fields of `self` that are missing from `other` or hold a different value
    ///
    /// The primary key is never part of the difference.
    pub fn compare(&self, other: &Record<T>) -> Fields {
        let pk = T::schema().primary_key();
        self.data
            .iter()
            .filter(|(k, v)| *k != pk && other.data.get(k) != Some(*v))
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }

    /// Primary-key field name, optionally prefixed
    pub fn primary_key_name(prefixed: bool) -> String {
        let schema = T::schema();
        if prefixed {
            schema.with_prefix(schema.primary_key())
        } else {
            schema.primary_key().to_string()
        }
    }

    /// Table name
    pub fn table_name() -> &'static str {
        T::schema().name()
    }

    /// Field-name prefix
    pub fn field_prefix() -> Option<&'static str> {
        T::schema().field_prefix()
    }

    /// Schema of this record type
    pub fn schema() -> &'static Schema {
        T::schema()
    }

    /// Metadata for a single field
    pub fn field_info(field: &str) -> Option<&'static FieldInfo> {
        T::schema().get(field)
    }

    /// `(field, value)` pairs in assignment order, unprefixed
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter()
    }

    /// `(field, value)` pairs in assignment order, prefixed
    pub fn iter_prefixed(&self) -> impl Iterator<Item = (String, &Value)> + '_ {
        let schema = T::schema();
        self.data.iter().map(move |(k, v)| (schema.with_prefix(k), v))
    }

    /// Underlying field mapping
    pub fn fields(&self) -> &Fields {
        &self.data
    }

    /// Number of fields set
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if no field is set
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: RecordType> Default for Record<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RecordType> Clone for Record<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: RecordType> PartialEq for Record<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len()
            && self.data.iter().all(|(k, v)| other.data.get(k) == Some(v))
    }
}

impl<T: RecordType> fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &T::schema().name())
            .field("data", &self.data)
            .finish()
    }
}

/// Renders the primary key, or nothing when unset
impl<T: RecordType> fmt::Display for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.primary_key().as_deref().unwrap_or(""))
    }
}
