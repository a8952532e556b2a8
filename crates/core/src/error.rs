//! Error types for flatstore
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every variant belongs to exactly one [`ErrorKind`], so callers can decide
//! whether to retry, report, or ignore a failure without matching on every
//! variant.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flatstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid setup (bad base directory, bad configuration)
    Construction,
    /// Schema violations, malformed query operands, malformed index keys
    Validation,
    /// Duplicate unique keys, corrupted index lines, identifier overflow
    Integrity,
    /// Lock failures and file create/read/write failures
    Io,
    /// Missing record
    NotFound,
}

/// Error types for flatstore
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Base directory is missing, not a directory, or not writable
    #[error("{} is not a valid directory", path.display())]
    InvalidDirectory {
        /// Offending path
        path: PathBuf,
    },

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Field not in schema, non-scalar value, or failed field validator
    #[error("Schema violation on field '{field}': {reason}")]
    SchemaViolation {
        /// Field name (unprefixed)
        field: String,
        /// What went wrong
        reason: String,
    },

    /// Malformed query operand or operator
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Value cannot be used as an index key
    #[error("Invalid index key: {0}")]
    InvalidKey(String),

    /// Operation requires a persisted record
    #[error("Missing value for primary key {0}")]
    MissingPrimaryKey(String),

    /// Unique index already holds the key for another record
    #[error("Duplicate entry '{key}' for unique key '{field}'")]
    DuplicateKey {
        /// Indexed field
        field: String,
        /// Offending key
        key: String,
    },

    /// Data corruption detected (malformed index line, undecodable body)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// No identifiers left for today in this table
    #[error("Identifier overflow: {0}")]
    IdentifierOverflow(String),

    /// Advisory lock could not be acquired or released
    #[error("Could not lock file {}: {source}", path.display())]
    LockError {
        /// Locked file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: io::Error,
    },

    /// Record not found in storage
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidDirectory { .. } | Error::ConfigError(_) => ErrorKind::Construction,
            Error::SchemaViolation { .. }
            | Error::InvalidArgument(_)
            | Error::InvalidKey(_)
            | Error::MissingPrimaryKey(_) => ErrorKind::Validation,
            Error::DuplicateKey { .. }
            | Error::Corruption(_)
            | Error::IdentifierOverflow(_)
            | Error::SerializationError(_) => ErrorKind::Integrity,
            Error::IoError(_) | Error::LockError { .. } => ErrorKind::Io,
            Error::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Shorthand for a [`Error::SchemaViolation`]
    pub fn schema_violation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for [`ErrorKind::NotFound`]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
