//! flatstore - schema-bound records over plain files
//!
//! flatstore persists typed records as one file per record and keeps one
//! line-oriented key file per indexed field, with no server and no binary
//! page format.
//!
//! # Quick Start
//!
//! ```ignore
//! use flatstore::{FieldInfo, FieldType, FlatFile, Finder, Operator, Record, RecordType, Schema, Storage};
//! use once_cell::sync::Lazy;
//!
//! struct User;
//!
//! static USER: Lazy<Schema> = Lazy::new(|| {
//!     Schema::new("User", "id")
//!         .field(FieldInfo::new("email", FieldType::String).unique())
//!         .field(FieldInfo::new("age", FieldType::Integer).indexed())
//! });
//!
//! impl RecordType for User {
//!     fn schema() -> &'static Schema { &USER }
//! }
//!
//! let store = FlatFile::open("/var/lib/app/data")?;
//!
//! let mut user = Record::<User>::new();
//! user.set("email", "a@x.com")?;
//! user.set("age", 30)?;
//! store.save(&mut user)?;
//!
//! let mut finder = Finder::<User>::new();
//! finder.filter("age", Operator::Ge, 18)?.sort("email", false).page(10, 0);
//! store.find(&mut finder)?;
//! ```
//!
//! # Architecture
//!
//! Records, finders and the [`Storage`] / [`Formatter`] seams live in
//! `flatstore-core`; the [`FlatFile`] engine and [`JsonFormatter`] live in
//! `flatstore-storage`. This crate re-exports both.

pub use flatstore_core::*;
pub use flatstore_storage::{
    codec, config, flatfile, FlatFile, FlatFileConfig, JsonFormatter, CONFIG_FILE_NAME,
    DEFAULT_SWAP_SIZE,
};
