//! Store configuration.

use std::path::PathBuf;

use super::{LocalStore, MemoryStore, RemoteStore, S3Config, S3Store, StoreResult};

/// Which backend receives uploaded objects
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// S3-compatible storage (AWS S3, MinIO, R2, etc.)
    S3(S3Config),
    /// Directory mirror
    Local { path: PathBuf },
    /// In-process map, discarded at exit
    Memory,
}

impl StoreConfig {
    pub fn local(path: PathBuf) -> Self {
        StoreConfig::Local { path }
    }

    /// Build the store backend described by this config
    pub fn build(&self) -> StoreResult<Box<dyn RemoteStore>> {
        match self {
            StoreConfig::S3(config) => Ok(Box::new(S3Store::new(config.clone())?)),
            StoreConfig::Local { path } => {
                std::fs::create_dir_all(path)?;
                Ok(Box::new(LocalStore::new(path.clone())))
            }
            StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
        }
    }
}
