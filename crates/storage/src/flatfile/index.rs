//! Key files
//!
//! One file per indexed field, one line per distinct key:
//!
//! ```text
//! a@x.com=["2026101600000001"]
//! 30=["2026101600000001","2026101600000002"]
//! ```
//!
//! The right-hand side is the formatter's encoding of the id array. Empty
//! lines are skipped. Every mutation is a full streaming rewrite: read all
//! lines under a shared lock into a [`SwapBuffer`], then, only if a line
//! changed, replace the file under an exclusive lock.

use std::io::BufRead;
use std::path::PathBuf;

use tracing::debug;

use flatstore_core::{Error, Formatter, Result, Value, KEY_SEPARATOR};

use super::file::FileIo;
use super::swap::SwapBuffer;

/// Index file extension
pub(crate) const KEY_EXTENSION: &str = "key";

#[derive(Debug, Clone, Copy)]
enum Mutation<'a> {
    Insert { id: &'a str, unique: bool },
    Remove { id: &'a str },
}

/// Handle on one field's key file
pub(crate) struct KeyIndex<'a> {
    path: PathBuf,
    field: &'a str,
    io: FileIo,
    formatter: &'a dyn Formatter,
    swap_size: usize,
}

impl<'a> KeyIndex<'a> {
    pub(crate) fn new(
        path: PathBuf,
        field: &'a str,
        io: FileIo,
        formatter: &'a dyn Formatter,
        swap_size: usize,
    ) -> Self {
        Self {
            path,
            field,
            io,
            formatter,
            swap_size,
        }
    }

    /// Visit every `(key, ids)` entry; a missing file has no entries
    pub(crate) fn scan(&self, mut visit: impl FnMut(&str, Vec<String>)) -> Result<()> {
        self.for_each_line(|line| {
            let (key, raw) = self.split_line(line)?;
            visit(key, self.decode_ids(raw)?);
            Ok(())
        })
    }

    /// Ids stored under exactly `key`
    pub(crate) fn lookup(&self, key: &str) -> Result<Vec<String>> {
        let mut found = Vec::new();
        self.for_each_line(|line| {
            let (k, raw) = self.split_line(line)?;
            if k == key {
                found.extend(self.decode_ids(raw)?);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Add `id` under `key`; returns whether the file changed
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if `unique` and the key already holds
    /// another id. Nothing is written in that case.
    pub(crate) fn insert(&self, key: &str, id: &str, unique: bool) -> Result<bool> {
        self.rewrite(key, Mutation::Insert { id, unique })
    }

    /// Drop `id` from `key`; returns whether the file changed
    pub(crate) fn remove(&self, key: &str, id: &str) -> Result<bool> {
        self.rewrite(key, Mutation::Remove { id })
    }

    fn rewrite(&self, key: &str, mutation: Mutation<'_>) -> Result<bool> {
        let mut swap = SwapBuffer::new(self.swap_size);
        let mut found = false;
        let mut changed = false;

        self.for_each_line(|line| {
            let (k, raw) = self.split_line(line)?;
            if k != key {
                swap.write_line(line.as_bytes())?;
                return Ok(());
            }
            found = true;

            let mut ids = self.decode_ids(raw)?;
            match mutation {
                Mutation::Insert { id, .. } if ids.iter().any(|x| x == id) => {
                    swap.write_line(line.as_bytes())?;
                }
                Mutation::Insert { unique: true, .. } if !ids.is_empty() => {
                    return Err(Error::DuplicateKey {
                        field: self.field.to_string(),
                        key: key.to_string(),
                    });
                }
                Mutation::Insert { id, .. } => {
                    ids.push(id.to_string());
                    swap.write_line(&self.encode_line(key, &ids)?)?;
                    changed = true;
                }
                Mutation::Remove { id } => match ids.iter().position(|x| x == id) {
                    Some(pos) => {
                        ids.remove(pos);
                        if !ids.is_empty() {
                            swap.write_line(&self.encode_line(key, &ids)?)?;
                        }
                        changed = true;
                    }
                    None => swap.write_line(line.as_bytes())?,
                },
            }
            Ok(())
        })?;

        if let Mutation::Insert { id, .. } = mutation {
            if !found {
                swap.write_line(&self.encode_line(key, &[id.to_string()])?)?;
                changed = true;
            }
        }

        if changed {
            debug!(
                target: "flatstore::flatfile",
                field = self.field,
                key,
                spilled = swap.is_spilled(),
                "Rewriting key file"
            );
            let mut reader = swap.into_reader()?;
            self.io.write_from(&self.path, &mut reader)?;
        }
        Ok(changed)
    }

    fn for_each_line(&self, mut f: impl FnMut(&str) -> Result<()>) -> Result<()> {
        self.io.with_reader(&self.path, |reader| {
            for line in reader.lines() {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                f(&line)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn split_line<'l>(&self, line: &'l str) -> Result<(&'l str, &'l str)> {
        line.split_once(KEY_SEPARATOR).ok_or_else(|| {
            Error::Corruption(format!(
                "line without '{}' in {}",
                KEY_SEPARATOR,
                self.path.display()
            ))
        })
    }

    fn decode_ids(&self, raw: &str) -> Result<Vec<String>> {
        let corrupt = || Error::Corruption(format!("bad id list in {}", self.path.display()));

        let value = self.formatter.decode(raw.as_bytes()).map_err(|_| corrupt())?;
        let items = match value {
            Value::Array(items) => items,
            _ => return Err(corrupt()),
        };
        items
            .iter()
            .map(|v| v.index_key().ok_or_else(corrupt))
            .collect()
    }

    fn encode_line(&self, key: &str, ids: &[String]) -> Result<Vec<u8>> {
        let array = Value::Array(ids.iter().map(|id| Value::from(id.as_str())).collect());
        let mut line = Vec::with_capacity(key.len() + 1 + ids.len() * 20);
        line.extend_from_slice(key.as_bytes());
        line.push(KEY_SEPARATOR as u8);
        line.extend_from_slice(&self.formatter.encode(&array)?);
        Ok(line)
    }
}
