//! Engine configuration via `flatstore.toml`
//!
//! A store directory may carry a `flatstore.toml` next to its table
//! directories. [`FlatFile::open`](crate::FlatFile::open) reads it when
//! present and falls back to defaults otherwise.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use flatstore_core::{Error, Result};

/// Config file name placed in the store's base directory.
pub const CONFIG_FILE_NAME: &str = "flatstore.toml";

/// Default size of the in-memory rewrite buffer (1 MiB).
pub const DEFAULT_SWAP_SIZE: usize = 1_048_576;

/// FlatFile engine configuration.
///
/// # Example
///
/// ```toml
/// # zstd-compress every data and key file
/// compress = false
///
/// # Bytes of a key-file rewrite kept in memory before spilling to a temp file
/// swap_size = 1048576
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatFileConfig {
    /// Base directory holding one sub-directory per table.
    ///
    /// Not read from `flatstore.toml`; the file's own directory is used.
    #[serde(skip)]
    pub path: PathBuf,
    /// Compress data and key files.
    #[serde(default)]
    pub compress: bool,
    /// In-memory rewrite buffer size in bytes.
    #[serde(default = "default_swap_size")]
    pub swap_size: usize,
}

fn default_swap_size() -> usize {
    DEFAULT_SWAP_SIZE
}

impl Default for FlatFileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            compress: false,
            swap_size: DEFAULT_SWAP_SIZE,
        }
    }
}

impl FlatFileConfig {
    /// Defaults for the store rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Enable or disable compression.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the rewrite buffer size.
    pub fn swap_size(mut self, bytes: usize) -> Self {
        self.swap_size = bytes;
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# FlatFile store configuration
#
# Compress every data (.dat) and key (.key) file with zstd (default: false).
# File names do not change; a store must always be opened with the same setting.
compress = false

# Bytes of a key-file rewrite kept in memory before spilling to a temporary
# file; 0 always spills (default: 1048576).
swap_size = 1048576
"#
    }

    /// Read and parse config from a file path.
    ///
    /// `path` is set to the file's parent directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut config: FlatFileConfig = toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.path = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::ConfigError(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
