//! FlatFile storage engine
//!
//! Stores every record as one file and every indexed field as one key file:
//!
//! ```text
//! <base>/<table>/<id>.dat     formatter-encoded field mapping
//! <base>/<table>/<field>.key  key=<encoded id array>, one line per key
//! ```
//!
//! # Consistency
//!
//! Each file operation takes its own advisory lock and releases it before
//! the next one. A save updates the key files first and the data file last,
//! so a concurrent reader may see an index entry whose data file does not
//! exist yet. `find` drops such ids. Writers to the same table must be
//! serialized by the caller: the id counter is derived from the directory
//! listing, not stored.

mod file;
mod index;
mod query;
mod swap;
pub mod uid;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use flatstore_core::{
    normalize_key, Condition, Error, FieldInfo, Finder, Formatter, Record, RecordType, Result,
    Schema, Storage, Value,
};

use crate::codec::JsonFormatter;
use crate::config::{FlatFileConfig, CONFIG_FILE_NAME};
use file::FileIo;
use index::{KeyIndex, KEY_EXTENSION};
use uid::DATA_EXTENSION;

/// Flat-file backed [`Storage`]
///
/// # Example
///
/// ```no_run
/// use flatstore_core::{FieldInfo, FieldType, Finder, Operator, Record, RecordType, Schema, Storage};
/// use flatstore_storage::{codec::JsonFormatter, FlatFile};
/// use once_cell::sync::Lazy;
///
/// struct User;
///
/// static USER: Lazy<Schema> = Lazy::new(|| {
///     Schema::new("User", "id")
///         .field(FieldInfo::new("email", FieldType::String).unique())
///         .field(FieldInfo::new("age", FieldType::Integer).indexed())
/// });
///
/// impl RecordType for User {
///     fn schema() -> &'static Schema {
///         &USER
///     }
/// }
///
/// # fn main() -> flatstore_core::Result<()> {
/// let store = FlatFile::new("/var/lib/app/data", JsonFormatter)?;
///
/// let mut user = Record::<User>::new();
/// user.set("email", "a@x.com")?;
/// user.set("age", 30)?;
/// store.save(&mut user)?;
///
/// let mut finder = Finder::<User>::new();
/// finder.filter("age", Operator::Eq, 30)?;
/// store.find(&mut finder)?;
/// assert_eq!(finder.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct FlatFile {
    config: FlatFileConfig,
    io: FileIo,
    formatter: Box<dyn Formatter>,
}

impl FlatFile {
    /// Engine over `path` with default settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDirectory`] if `path` is not an existing,
    /// writable directory.
    pub fn new(path: impl Into<PathBuf>, formatter: impl Formatter + 'static) -> Result<Self> {
        Self::with_config(FlatFileConfig::new(path), formatter)
    }

    /// Engine with explicit settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDirectory`] if the base directory is unusable.
    pub fn with_config(config: FlatFileConfig, formatter: impl Formatter + 'static) -> Result<Self> {
        check_directory(&config.path)?;

        info!(
            target: "flatstore::flatfile",
            path = %config.path.display(),
            compress = config.compress,
            swap_size = config.swap_size,
            formatter = formatter.formatter_id(),
            "Opened flat-file store"
        );

        Ok(Self {
            io: FileIo::new(config.compress),
            config,
            formatter: Box::new(formatter),
        })
    }

    /// JSON engine over `path`, reading `flatstore.toml` there if present
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the config file is invalid and
    /// [`Error::InvalidDirectory`] if `path` is unusable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_path = path.join(CONFIG_FILE_NAME);
        let config = if config_path.is_file() {
            FlatFileConfig::from_file(&config_path)?
        } else {
            FlatFileConfig::new(path)
        };
        Self::with_config(config, JsonFormatter)
    }

    /// Base directory
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Active settings
    pub fn config(&self) -> &FlatFileConfig {
        &self.config
    }

    /// Identifier of the active formatter
    pub fn formatter_id(&self) -> &str {
        self.formatter.formatter_id()
    }

    fn table_dir(&self, schema: &Schema) -> PathBuf {
        self.config.path.join(schema.name())
    }

    fn data_path(&self, schema: &Schema, id: &str) -> PathBuf {
        self.table_dir(schema)
            .join(format!("{}.{}", id, DATA_EXTENSION))
    }

    fn key_index<'a>(&'a self, schema: &Schema, field: &'a str) -> KeyIndex<'a> {
        KeyIndex::new(
            self.table_dir(schema)
                .join(format!("{}.{}", field, KEY_EXTENSION)),
            field,
            self.io,
            self.formatter.as_ref(),
            self.config.swap_size,
        )
    }

    /// Primary key of `record`, checked for use as a file name
    fn record_id<T: RecordType>(record: &Record<T>) -> Result<String> {
        let id = record
            .primary_key()
            .ok_or_else(|| Error::MissingPrimaryKey(Record::<T>::primary_key_name(true)))?;
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::InvalidKey(format!(
                "'{}' cannot be used as a record identifier",
                id
            )));
        }
        Ok(id)
    }

    /// Key text of every indexed field of `record`, in schema order
    fn index_keys<T: RecordType>(
        record: &Record<T>,
    ) -> Result<Vec<(&'static FieldInfo, Option<String>)>> {
        T::schema()
            .indexed_fields()
            .map(|info| {
                let key = match record.get(&info.name) {
                    Some(value) => normalize_key(value)?,
                    None => None,
                };
                Ok((info, key))
            })
            .collect()
    }

    /// Fail if a unique key is already held by a record other than `id`
    fn check_unique(
        &self,
        schema: &Schema,
        info: &FieldInfo,
        key: &str,
        id: Option<&str>,
    ) -> Result<()> {
        let holders = self.key_index(schema, &info.name).lookup(key)?;
        if holders.iter().any(|holder| Some(holder.as_str()) != id) {
            return Err(Error::DuplicateKey {
                field: info.name.clone(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn write_record<T: RecordType>(&self, record: &Record<T>, id: &str) -> Result<()> {
        let body = self
            .formatter
            .encode(&Value::Object(record.fields().clone()))?;
        self.io.write(&self.data_path(T::schema(), id), &body)
    }

    fn insert<T: RecordType>(&self, record: &mut Record<T>) -> Result<()> {
        let schema = T::schema();
        let keys = Self::index_keys(record)?;

        for (info, key) in &keys {
            if let (true, Some(key)) = (info.unique, key) {
                self.check_unique(schema, info, key, None)?;
            }
        }

        let id = uid::next_id(&self.table_dir(schema))?;
        record.set(schema.primary_key(), id.as_str())?;

        for (info, key) in &keys {
            if let Some(key) = key {
                self.key_index(schema, &info.name)
                    .insert(key, &id, info.unique)?;
            }
        }
        self.write_record(record, &id)?;

        debug!(target: "flatstore::flatfile", table = schema.name(), id = %id, "Inserted record");
        Ok(())
    }

    fn update<T: RecordType>(&self, record: &mut Record<T>, id: String) -> Result<()> {
        let schema = T::schema();

        let mut stored = Record::<T>::with_primary_key(id.as_str());
        if !self.load(&mut stored)? {
            return Err(Error::NotFound(format!("{}/{}", schema.name(), id)));
        }

        let changed: BTreeSet<String> = record
            .compare(&stored)
            .names()
            .chain(stored.compare(record).names())
            .map(str::to_string)
            .collect();

        let old_keys = Self::index_keys(&stored)?;
        let new_keys = Self::index_keys(record)?;
        let updates: Vec<_> = old_keys
            .into_iter()
            .zip(new_keys)
            .filter(|((info, _), _)| changed.contains(&info.name))
            .map(|((info, old), (_, new))| (info, old, new))
            .collect();

        for (info, _, new) in &updates {
            if let (true, Some(key)) = (info.unique, new) {
                self.check_unique(schema, info, key, Some(id.as_str()))?;
            }
        }

        for (info, old, new) in &updates {
            let index = self.key_index(schema, &info.name);
            if let Some(key) = old {
                index.remove(key, &id)?;
            }
            if let Some(key) = new {
                index.insert(key, &id, info.unique)?;
            }
        }
        self.write_record(record, &id)?;

        debug!(
            target: "flatstore::flatfile",
            table = schema.name(),
            id = %id,
            changed = changed.len(),
            reindexed = updates.len(),
            "Updated record"
        );
        Ok(())
    }

    fn match_condition<T: RecordType>(&self, condition: &Condition) -> Result<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        // Only declared indexed fields have a key file
        if !T::schema()
            .get(&condition.field)
            .map_or(false, |info| info.indexed)
        {
            return Ok(ids);
        }
        self.key_index(T::schema(), &condition.field)
            .scan(|key, holders| {
                if query::key_matches(key, condition.op, &condition.value) {
                    ids.extend(holders);
                }
            })?;
        Ok(ids)
    }
}

impl Storage for FlatFile {
    fn connect(&self) -> Result<()> {
        Ok(())
    }

    fn load<T: RecordType>(&self, record: &mut Record<T>) -> Result<bool> {
        let id = Self::record_id(record)?;
        let body = match self.io.read(&self.data_path(T::schema(), &id))? {
            Some(body) if !body.is_empty() => body,
            _ => return Ok(false),
        };

        let fields = match self.formatter.decode(&body)? {
            Value::Object(fields) => fields,
            other => {
                return Err(Error::Corruption(format!(
                    "{}/{} holds {} instead of a field mapping",
                    T::schema().name(),
                    id,
                    other.type_name()
                )))
            }
        };
        let pk = T::schema().primary_key();
        for (name, value) in fields {
            if name != pk {
                record.set(&name, value)?;
            }
        }
        Ok(true)
    }

    fn save<T: RecordType>(&self, record: &mut Record<T>) -> Result<()> {
        if record.is_persisted() {
            let id = Self::record_id(record)?;
            self.update(record, id)
        } else {
            self.insert(record)
        }
    }

    fn remove<T: RecordType>(&self, record: &mut Record<T>) -> Result<bool> {
        if !record.is_persisted() {
            return Ok(false);
        }
        let schema = T::schema();
        let id = Self::record_id(record)?;

        // Index entries follow the stored values, not unsaved edits
        let mut stored = Record::<T>::with_primary_key(id.as_str());
        let keys = if self.load(&mut stored)? {
            Self::index_keys(&stored)?
        } else {
            Self::index_keys(record)?
        };

        for (info, key) in &keys {
            if let Some(key) = key {
                self.key_index(schema, &info.name).remove(key, &id)?;
            }
        }
        if !self.io.remove(&self.data_path(schema, &id))? {
            debug!(
                target: "flatstore::flatfile",
                table = schema.name(),
                id = %id,
                "No data file to remove"
            );
            return Ok(false);
        }
        record.unset(schema.primary_key());

        debug!(target: "flatstore::flatfile", table = schema.name(), id = %id, "Removed record");
        Ok(true)
    }

    fn find<T: RecordType>(&self, finder: &mut Finder<T>) -> Result<usize> {
        let schema = T::schema();
        let filters = finder.filters(false);

        let ids = query::evaluate(&filters.conditions, |condition| {
            self.match_condition::<T>(condition)
        })?;
        let matched = ids.len();

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let mut record = Record::<T>::with_primary_key(id.as_str());
            match self.load(&mut record) {
                Ok(true) => records.push(record),
                Ok(false) => warn!(
                    target: "flatstore::flatfile",
                    table = schema.name(),
                    id = %id,
                    "Dropping index entry without data file"
                ),
                Err(e) => warn!(
                    target: "flatstore::flatfile",
                    table = schema.name(),
                    id = %id,
                    error = %e,
                    "Dropping unreadable record"
                ),
            }
        }

        if !filters.sorting.is_empty() {
            records.sort_by(|a, b| {
                for (field, descending) in &filters.sorting {
                    let left = a.get(field).unwrap_or(&Value::Null);
                    let right = b.get(field).unwrap_or(&Value::Null);
                    let ord = left.cmp_loose(right);
                    let ord = if *descending { ord.reverse() } else { ord };
                    if ord.is_ne() {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        let records: Vec<_> = match filters.paging {
            Some(page) => records
                .into_iter()
                .skip(page.offset)
                .take(page.count)
                .collect(),
            None => records,
        };

        finder.clear_results();
        for record in records {
            finder.push(record);
        }

        debug!(
            target: "flatstore::flatfile",
            table = schema.name(),
            matched,
            returned = finder.len(),
            "Find complete"
        );
        Ok(finder.len())
    }
}

impl fmt::Debug for FlatFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatFile")
            .field("config", &self.config)
            .field("formatter", &self.formatter.formatter_id())
            .finish()
    }
}

fn check_directory(path: &Path) -> Result<()> {
    let invalid = || Error::InvalidDirectory {
        path: path.to_path_buf(),
    };
    let metadata = std::fs::metadata(path).map_err(|_| invalid())?;
    if !metadata.is_dir() || metadata.permissions().readonly() {
        return Err(invalid());
    }
    Ok(())
}
