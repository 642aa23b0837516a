//! Directory-backed save slots for simulated careers.
use encore_game::SaveStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("invalid save slot name {0:?}")]
    InvalidSlot(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One JSON file per slot under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create the store, making the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| FileStoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, FileStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(FileStoreError::InvalidSlot(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl SaveStore for FileStore {
    type Error = FileStoreError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStoreError::Io { path, source }),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(key)?;
        fs::write(&path, blob).map_err(|source| FileStoreError::Io { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileStoreError::Io { path, source }),
        }
    }
}
