//! Remote store trait definition.

use bytes::Bytes;
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object not found
    #[error("object not found: {0}")]
    NotFound(String),

    /// Key cannot be mapped onto the backend
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The store answered and refused the request (auth, policy, quota)
    #[error("rejected by store: {0}")]
    Rejected(String),

    /// The store could not be reached (DNS, connect, timeout)
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal capability the intake pipeline consumes from object storage.
///
/// Keys are `/`-separated paths such as `case_001/evidence/disk.img`.
/// Credential acquisition is the backend's concern, never the caller's.
pub trait RemoteStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    fn put(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Human-readable location, used in logs and reports
    fn location(&self) -> String;
}

impl<T: RemoteStore + ?Sized> RemoteStore for Box<T> {
    fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        (**self).put(key, data)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        (**self).put(key, data)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
