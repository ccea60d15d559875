//! Remote object storage.
//!
//! The intake pipeline only needs to put an object under a key. Backends:
//! - S3-compatible object storage (AWS S3, MinIO, R2, etc.)
//! - Local directory mirror (air-gapped intake, staging)
//! - In-memory map (tests and dry runs)

mod backend;
mod config;
mod local;
mod memory;
mod s3;

pub use backend::{RemoteStore, StoreError, StoreResult};
pub use config::StoreConfig;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};
