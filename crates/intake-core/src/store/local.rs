//! Local directory store backend.

use bytes::Bytes;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::backend::{RemoteStore, StoreError, StoreResult};

/// Directory-backed store.
///
/// Keys map onto relative paths below the base directory:
/// ```text
/// {base_path}/
///   {case-id}/
///     evidence/{filename}
///     hashes/{filename}.sha256
/// ```
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the full path for a key, refusing anything that escapes the base
    fn key_path(&self, key: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }

    pub fn get(&self, key: &str) -> StoreResult<Bytes> {
        let path = self.key_path(key)?;
        let data = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }
}

impl RemoteStore for LocalStore {
    fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &data)?;
        tracing::debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(())
    }

    fn location(&self) -> String {
        format!("file://{}", self.base_path.display())
    }
}
