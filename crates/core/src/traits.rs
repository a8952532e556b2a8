//! Core traits for storage and serialization
//!
//! [`Storage`] is the seam between records and wherever they are kept;
//! [`Formatter`] is the seam between structured values and their byte form.
//! Both enable swapping implementations without touching record or finder
//! code.

use crate::error::Result;
use crate::finder::Finder;
use crate::record::{Record, RecordType};
use crate::value::Value;

/// Persistence backend for records
///
/// Thread safety: implementations must be safe to share across threads
/// (requires Send + Sync). Cross-process safety is the implementation's
/// concern.
pub trait Storage: Send + Sync {
    /// Verify the backend is usable, preparing it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or created.
    fn connect(&self) -> Result<()>;

    /// Populate `record` from storage using its primary key
    ///
    /// Returns `false`, leaving the record untouched, when no record with that
    /// key exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPrimaryKey`](crate::Error::MissingPrimaryKey)
    /// if the record has no primary key, or an error if the stored bytes
    /// cannot be read or decoded.
    fn load<T: RecordType>(&self, record: &mut Record<T>) -> Result<bool>;

    /// Insert (no primary key) or update (primary key set) `record`
    ///
    /// On insert the generated key is assigned to the record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`](crate::Error::DuplicateKey) on a
    /// unique-index conflict, leaving storage unchanged.
    fn save<T: RecordType>(&self, record: &mut Record<T>) -> Result<()>;

    /// Delete `record`, clearing its primary key
    ///
    /// Returns `false` when the record was never persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the record or its index entries cannot be removed.
    fn remove<T: RecordType>(&self, record: &mut Record<T>) -> Result<bool>;

    /// Run the finder's query, replacing its results
    ///
    /// Returns the number of records placed in the finder.
    ///
    /// # Errors
    ///
    /// Returns an error if an index file cannot be read.
    fn find<T: RecordType>(&self, finder: &mut Finder<T>) -> Result<usize>;
}

/// Byte encoding of structured values
///
/// This trait is object-safe so the storage engine can hold a
/// `Box<dyn Formatter>` chosen at runtime.
pub trait Formatter: Send + Sync {
    /// Unique identifier for this formatter
    fn formatter_id(&self) -> &str;

    /// Encode `value` to bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`](crate::Error::SerializationError)
    /// if the value cannot be represented.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decode bytes produced by [`encode`](Self::encode)
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`](crate::Error::SerializationError)
    /// if the bytes are malformed.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;

    /// Deep-merge `other` into `base`
    fn merge(&self, base: &Value, other: &Value) -> Value;
}
