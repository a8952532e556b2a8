//! Locked file access
//!
//! Every read holds a shared advisory lock and every write or delete an
//! exclusive one, for the duration of that single file operation only.
//! With compression on, file bodies are zstd streams; names do not change.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use flatstore_core::{Error, Result};

/// zstd level used for compressed stores
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FileIo {
    compress: bool,
}

impl FileIo {
    pub(crate) fn new(compress: bool) -> Self {
        Self { compress }
    }

    /// Run `f` over the decoded contents of `path` under a shared lock.
    ///
    /// Returns `None` if the file does not exist.
    pub(crate) fn with_reader<R>(
        &self,
        path: &Path,
        f: impl FnOnce(&mut dyn BufRead) -> Result<R>,
    ) -> Result<Option<R>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        lock_shared(&file, path)?;
        let result = self.read_body(&file, f);
        let unlocked = unlock(&file, path);
        let value = result?;
        unlocked?;
        Ok(Some(value))
    }

    /// Whole decoded contents of `path`, `None` if absent.
    pub(crate) fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        self.with_reader(path, |reader| {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        })
    }

    /// Replace the contents of `path` with `bytes`.
    pub(crate) fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut reader = bytes;
        self.write_from(path, &mut reader)
    }

    /// Replace the contents of `path` with everything `reader` yields.
    ///
    /// The parent directory is created if missing. The file is truncated only
    /// once the exclusive lock is held.
    pub(crate) fn write_from(&self, path: &Path, reader: &mut dyn Read) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        lock_exclusive(&file, path)?;
        let result = self.write_body(&file, reader);
        let unlocked = unlock(&file, path);
        result?;
        unlocked
    }

    /// Delete `path` under an exclusive lock; `false` if it did not exist.
    pub(crate) fn remove(&self, path: &Path) -> Result<bool> {
        let file = match OpenOptions::new().write(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        lock_exclusive(&file, path)?;
        let result = fs::remove_file(path);
        drop(file);
        result?;
        Ok(true)
    }

    fn read_body<R>(&self, file: &File, f: impl FnOnce(&mut dyn BufRead) -> Result<R>) -> Result<R> {
        if file.metadata()?.len() == 0 {
            return f(&mut io::empty());
        }
        if self.compress {
            let decoder = zstd::Decoder::new(file)?;
            f(&mut BufReader::new(decoder))
        } else {
            f(&mut BufReader::new(file))
        }
    }

    fn write_body(&self, file: &File, reader: &mut dyn Read) -> Result<()> {
        file.set_len(0)?;
        let mut out = file;
        if self.compress {
            let mut encoder = zstd::Encoder::new(out, COMPRESSION_LEVEL)?;
            io::copy(reader, &mut encoder)?;
            encoder.finish()?;
        } else {
            io::copy(reader, &mut out)?;
            out.flush()?;
        }
        Ok(())
    }
}

fn lock_shared(file: &File, path: &Path) -> Result<()> {
    fs2::FileExt::lock_shared(file).map_err(|source| Error::LockError {
        path: path.to_path_buf(),
        source,
    })
}

fn lock_exclusive(file: &File, path: &Path) -> Result<()> {
    fs2::FileExt::lock_exclusive(file).map_err(|source| Error::LockError {
        path: path.to_path_buf(),
        source,
    })
}

fn unlock(file: &File, path: &Path) -> Result<()> {
    fs2::FileExt::unlock(file).map_err(|source| Error::LockError {
        path: path.to_path_buf(),
        source,
    })
}
