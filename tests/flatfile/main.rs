//! FlatFile Integration Tests
//!
//! Drives the `flatstore` facade end to end: several record types sharing a
//! store, queries, reopening a directory and shared access across threads.

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod persistence;
mod queries;
mod records;
