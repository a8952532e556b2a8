//! Core types and traits for flatstore
//!
//! This crate defines the foundational types used throughout the system:
//! - Value / Fields: scalar values and ordered field mappings
//! - Schema: static description of a record type
//! - Record: schema-bound entity
//! - Finder: query descriptor and result collection
//! - Validator: optional per-field value constraints
//! - Traits: Storage and Formatter seams
//! - Error: error type hierarchy
//! - Limits: index-key rules

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod error;
pub mod fields;
pub mod finder;
pub mod limits;
pub mod record;
pub mod schema;
pub mod traits;
pub mod validate;
pub mod value;

// Re-export commonly used types and traits
pub use error::{Error, ErrorKind, Result};
pub use fields::Fields;
pub use finder::{Clause, Combinator, Condition, Filters, Finder, Operator, Paging};
pub use limits::{normalize_key, validate_key, KEY_SEPARATOR, MAX_KEY_BYTES};
pub use record::{Record, RecordType};
pub use schema::{FieldInfo, FieldType, Schema};
pub use traits::{Formatter, Storage};
pub use validate::{StringKind, Validator};
pub use value::Value;
