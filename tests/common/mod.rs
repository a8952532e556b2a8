//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::{Path, PathBuf};

pub use flatstore::{
    Error, ErrorKind, FieldInfo, FieldType, Finder, FlatFile, FlatFileConfig, JsonFormatter,
    Operator, Record, RecordType, Schema, Storage, StringKind, Validator, Value,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

// ============================================================================
// Record Types
// ============================================================================

/// Prefixed record type with a unique and two plain indexes
pub struct User;

static USER: Lazy<Schema> = Lazy::new(|| {
    Schema::new("User", "id")
        .prefix("usr_")
        .field(
            FieldInfo::new("email", FieldType::String)
                .unique()
                .validator(Validator::string().is(StringKind::Email)),
        )
        .field(
            FieldInfo::new("age", FieldType::Integer)
                .indexed()
                .validator(Validator::number().range(0.0, 150.0).integer(true)),
        )
        .field(FieldInfo::new("city", FieldType::String).indexed())
        .field(FieldInfo::new("bio", FieldType::String))
});

impl RecordType for User {
    fn schema() -> &'static Schema {
        &USER
    }
}

/// Unprefixed record type sharing field names with [`User`]
pub struct Article;

static ARTICLE: Lazy<Schema> = Lazy::new(|| {
    Schema::new("Article", "id")
        .field(
            FieldInfo::new("slug", FieldType::String)
                .unique()
                .validator(Validator::string().length(1, 64)),
        )
        .field(FieldInfo::new("author", FieldType::String).indexed())
        .field(FieldInfo::new("city", FieldType::String).indexed())
        .field(FieldInfo::new("views", FieldType::Integer).indexed())
        .field(FieldInfo::new("body", FieldType::String))
});

impl RecordType for Article {
    fn schema() -> &'static Schema {
        &ARTICLE
    }
}

// ============================================================================
// TestStore
// ============================================================================

/// A FlatFile over a private temporary directory
pub struct TestStore {
    pub store: FlatFile,
    pub dir: TempDir,
}

impl TestStore {
    /// Default settings
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let store = FlatFile::new(dir.path(), JsonFormatter).expect("open store");
        Self { store, dir }
    }

    /// Custom settings; `config.path` is replaced by the temp dir
    pub fn with_config(config: FlatFileConfig) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = FlatFileConfig {
            path: dir.path().to_path_buf(),
            ..config
        };
        let store = FlatFile::with_config(config, JsonFormatter).expect("open store");
        Self { store, dir }
    }

    /// Open a second engine over the same directory
    pub fn reopen(&self) -> FlatFile {
        FlatFile::with_config(self.store.config().clone(), JsonFormatter).expect("reopen store")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.dir.path().join(table)
    }

    /// Raw key file contents, empty when absent
    pub fn key_file(&self, table: &str, field: &str) -> String {
        std::fs::read_to_string(self.table_dir(table).join(format!("{}.key", field)))
            .unwrap_or_default()
    }

    /// Number of data files in `table`
    pub fn data_files(&self, table: &str) -> usize {
        std::fs::read_dir(self.table_dir(table))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().map_or(false, |x| x == "dat"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn user(&self, email: &str, age: i64, city: &str) -> Record<User> {
        let mut user = Record::<User>::new();
        user.set("email", email).unwrap();
        user.set("age", age).unwrap();
        user.set("city", city).unwrap();
        self.store.save(&mut user).unwrap();
        user
    }

    pub fn article(&self, slug: &str, author: &str, views: i64) -> Record<Article> {
        let mut article = Record::<Article>::new();
        article.set("slug", slug).unwrap();
        article.set("author", author).unwrap();
        article.set("views", views).unwrap();
        self.store.save(&mut article).unwrap();
        article
    }

    /// Run `finder` and return the ids it produced, in result order
    pub fn ids<T: RecordType>(&self, finder: &mut Finder<T>) -> Vec<String> {
        self.store.find(finder).unwrap();
        finder.iter().map(|r| r.to_string()).collect()
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted ids of `records`
pub fn ids_of<T: RecordType>(records: &[&Record<T>]) -> Vec<String> {
    let mut ids: Vec<String> = records.iter().map(|r| r.to_string()).collect();
    ids.sort();
    ids
}
