//! Atomic TOML file operations.
//!
//! A thin typed handle for the runtime's durable files. Saves go through a
//! temporary file plus atomic rename so a crash mid-write never leaves a
//! half-written preference file behind.

use std::fs;
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use venture_core::error::{CoreError, Result};

/// A handle to a TOML file holding one value of type `T`.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new handle. The file itself is created lazily on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: successfully loaded
    /// - `Ok(None)`: file doesn't exist or is empty
    /// - `Err`: failed to read or parse
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = toml::from_str(&content)?;
        Ok(Some(data))
    }

    /// Serializes and saves `data` atomically.
    ///
    /// The parent directory is created on demand. The write goes to a
    /// sibling temp file which is then renamed over the target, so readers
    /// only ever observe the old or the new content.
    pub fn save(&self, data: &T) -> Result<()> {
        let content = toml::to_string_pretty(data)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|err| {
            // Best effort: don't leave the temp file around on failure.
            let _ = fs::remove_file(&tmp_path);
            CoreError::storage(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                err
            ))
        })
    }
}
