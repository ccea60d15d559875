//! Error taxonomy for the intake workflow
//!
//! Every failure is fatal to the current run and carries the stage it
//! happened in, so the operator can tell how far the intake progressed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Stage of the intake run an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Case directory layout and case log
    Organize,
    /// Reading and hashing the evidence source
    Hash,
    /// Writing the evidence copy and digest file
    StoreLocal,
    /// Uploading the evidence object
    UploadEvidence,
    /// Uploading the digest object
    UploadDigest,
    /// Re-checking a stored evidence file against its digest
    Verify,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Organize => "organize",
            Self::Hash => "hash",
            Self::StoreLocal => "store-local",
            Self::UploadEvidence => "upload-evidence",
            Self::UploadDigest => "upload-digest",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse error class surfaced to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    FilesystemError,
    IOError,
    UploadError,
    InvalidInput,
    DataError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FilesystemError => "FilesystemError",
            Self::IOError => "IOError",
            Self::UploadError => "UploadError",
            Self::InvalidInput => "InvalidInput",
            Self::DataError => "DataError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("cannot write {path}: {source}")]
    Filesystem {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to overwrite existing case data at {path}")]
    CaseExists { stage: Stage, path: PathBuf },

    #[error("cannot read evidence {path}: {source}")]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("evidence {path} truncated: expected {expected} bytes, read {actual}")]
    Truncated {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("upload of {key} failed: {source}")]
    Upload {
        stage: Stage,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid input: {0}")]
    InvalidCase(String),

    #[error("cannot determine the home directory; set a base directory explicitly")]
    NoHomeDirectory,

    #[error("{path} is not a SHA-256 digest file")]
    MalformedDigest { path: PathBuf },

    #[error("pipeline already ran; start a new intake run")]
    AlreadyRun,
}

impl IntakeError {
    pub(crate) fn filesystem(stage: Stage, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            stage,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(stage: Stage, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    /// Stage the run failed in
    pub fn stage(&self) -> Stage {
        match self {
            Self::Filesystem { stage, .. }
            | Self::CaseExists { stage, .. }
            | Self::Io { stage, .. }
            | Self::Upload { stage, .. } => *stage,
            Self::Truncated { .. } => Stage::Hash,
            Self::MalformedDigest { .. } => Stage::Verify,
            Self::InvalidCase(_) | Self::NoHomeDirectory | Self::AlreadyRun => Stage::Organize,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Filesystem { .. } | Self::CaseExists { .. } | Self::NoHomeDirectory => {
                ErrorKind::FilesystemError
            }
            Self::Io { .. } | Self::Truncated { .. } => ErrorKind::IOError,
            Self::Upload { .. } => ErrorKind::UploadError,
            Self::InvalidCase(_) | Self::AlreadyRun => ErrorKind::InvalidInput,
            Self::MalformedDigest { .. } => ErrorKind::DataError,
        }
    }

    /// Object key of a failed upload
    pub fn failed_key(&self) -> Option<&str> {
        match self {
            Self::Upload { key, .. } => Some(key),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;
