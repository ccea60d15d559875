//! In-memory store backend.

use bytes::Bytes;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use super::backend::{RemoteStore, StoreError, StoreResult};

/// In-process object map.
///
/// Keys registered with [`MemoryStore::fail_on`] are rejected on `put`,
/// which lets tests simulate a transport failure on one specific object.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
    put_log: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put` to `key` fail as unreachable
    pub fn fail_on(&self, key: impl Into<String>) {
        self.failing.lock().unwrap().insert(key.into());
    }

    /// Fetch an object by key
    pub fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Keys in the order `put` was attempted, failures included
    pub fn put_attempts(&self) -> Vec<String> {
        self.put_log.lock().unwrap().clone()
    }
}

impl RemoteStore for MemoryStore {
    fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        self.put_log.lock().unwrap().push(key.to_string());

        if self.failing.lock().unwrap().contains(key) {
            return Err(StoreError::Unreachable(format!(
                "simulated transport failure for {}",
                key
            )));
        }

        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    fn location(&self) -> String {
        "memory://".to_string()
    }
}
