//! Storage layer for flatstore
//!
//! This crate implements the flat-file storage backend:
//! - FlatFile: one file per record, one key file per indexed field
//! - Advisory file locks (shared for reads, exclusive for writes)
//! - Optional zstd compression of every file body
//! - Bounded-memory key-file rewrites through a swap buffer
//! - Date-prefixed base-36 record identifiers
//! - JsonFormatter: the reference value formatter
//! - FlatFileConfig: settings loaded from `flatstore.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod flatfile;

pub use codec::JsonFormatter;
pub use config::{FlatFileConfig, CONFIG_FILE_NAME, DEFAULT_SWAP_SIZE};
pub use flatfile::FlatFile;
