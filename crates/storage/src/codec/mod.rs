//! Value formatters.
//!
//! The formatter seam ([`flatstore_core::Formatter`]) decides how structured
//! values become bytes. Every record body and every key-file id-array goes
//! through the engine's formatter.
//!
//! `JsonFormatter` is the reference implementation.
//!
//! # Usage
//!
//! ```ignore
//! use flatstore_storage::{codec::JsonFormatter, FlatFile};
//!
//! let store = FlatFile::new("/var/lib/app/data", JsonFormatter)?;
//! ```

mod json;

pub use json::JsonFormatter;
