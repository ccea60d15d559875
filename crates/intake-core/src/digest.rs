//! SHA-256 digests and digest records for evidence integrity
//!
//! A digest record is the one-line `sha256sum` text format
//! (`<hex>  <filename>`), so stored hashes can be checked with standard
//! digest tooling as well as with [`verify_evidence`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{IntakeError, Result, Stage};

/// Length of a hex-encoded SHA-256 digest
pub const SHA256_HEX_LEN: usize = 64;

/// Extension of digest files next to the evidence name
pub const DIGEST_EXTENSION: &str = "sha256";

/// Lowercase hex SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha256Hex(String);

impl Sha256Hex {
    /// Parse a hex digest, normalising to lowercase
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() == SHA256_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(value.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calculate the SHA-256 digest of a byte slice
pub fn sha256_hex(data: &[u8]) -> Sha256Hex {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Sha256Hex(format!("{:x}", hasher.finalize()))
}

/// Evidence bytes read in a single full pass, with their digest
#[derive(Debug, Clone)]
pub struct HashedEvidence {
    pub source: PathBuf,
    pub bytes: Vec<u8>,
    pub digest: Sha256Hex,
}

impl HashedEvidence {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Read a file completely and hash exactly the bytes read.
///
/// Fails when the file cannot be opened or read, or when fewer bytes
/// arrive than the file's metadata declared.
pub fn read_and_hash(path: impl AsRef<Path>) -> Result<HashedEvidence> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IntakeError::io(Stage::Hash, path, e))?;
    let declared = file
        .metadata()
        .map_err(|e| IntakeError::io(Stage::Hash, path, e))?
        .len();

    hash_reader(file, declared, path)
}

/// Drain `reader` and hash the bytes, expecting at least `declared` of them
pub fn hash_reader<R: Read>(mut reader: R, declared: u64, path: &Path) -> Result<HashedEvidence> {
    let mut bytes = Vec::with_capacity(declared as usize);
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| IntakeError::io(Stage::Hash, path, e))?;

    let actual = bytes.len() as u64;
    if actual < declared {
        return Err(IntakeError::Truncated {
            path: path.to_path_buf(),
            expected: declared,
            actual,
        });
    }

    let digest = sha256_hex(&bytes);
    tracing::debug!("Hashed {} bytes from {}: {}", actual, path.display(), digest);

    Ok(HashedEvidence {
        source: path.to_path_buf(),
        bytes,
        digest,
    })
}

/// One line of a digest file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub digest: Sha256Hex,
    pub filename: Option<String>,
}

impl DigestRecord {
    pub fn new(digest: Sha256Hex, filename: impl Into<String>) -> Self {
        Self {
            digest,
            filename: Some(filename.into()),
        }
    }

    /// Digest file name for an evidence file name
    pub fn file_name_for(evidence_name: &str) -> String {
        format!("{}.{}", evidence_name, DIGEST_EXTENSION)
    }

    /// Render as a single `sha256sum` line with one trailing newline
    pub fn to_line(&self) -> String {
        match &self.filename {
            Some(name) => format!("{}  {}\n", self.digest, name),
            None => format!("{}\n", self.digest),
        }
    }

    /// Parse the first line of a digest file.
    ///
    /// Accepts a bare digest, or a digest followed by one or two spaces and
    /// a file name, optionally with the `*` binary-mode marker.
    pub fn parse(text: &str) -> Option<Self> {
        let line = text.lines().next()?.trim_end_matches('\r');
        let (hex, rest) = match line.split_once(' ') {
            Some((hex, rest)) => (hex, Some(rest)),
            None => (line, None),
        };
        let digest = Sha256Hex::parse(hex)?;

        let filename = rest
            .map(|r| r.strip_prefix(' ').unwrap_or(r))
            .map(|r| r.strip_prefix('*').unwrap_or(r))
            .filter(|r| !r.is_empty())
            .map(String::from);

        Some(Self { digest, filename })
    }
}

/// Verification status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Hash matches the stored digest
    Verified,
    /// Hash does not match (evidence altered or digest damaged)
    Corrupted,
}

/// Result of re-checking stored evidence against its digest file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestVerification {
    pub evidence_path: PathBuf,
    pub digest_path: PathBuf,
    pub expected: Sha256Hex,
    pub actual: Sha256Hex,
    pub status: VerificationStatus,
}

/// Re-hash an evidence file and compare it with its digest file.
/// Never modifies either file.
pub fn verify_evidence(
    evidence_path: impl AsRef<Path>,
    digest_path: impl AsRef<Path>,
) -> Result<DigestVerification> {
    let evidence_path = evidence_path.as_ref();
    let digest_path = digest_path.as_ref();

    let text = std::fs::read_to_string(digest_path)
        .map_err(|e| IntakeError::io(Stage::Verify, digest_path, e))?;
    let record = DigestRecord::parse(&text).ok_or_else(|| IntakeError::MalformedDigest {
        path: digest_path.to_path_buf(),
    })?;

    let hashed = read_and_hash(evidence_path).map_err(|e| match e {
        IntakeError::Io { path, source, .. } => IntakeError::Io {
            stage: Stage::Verify,
            path,
            source,
        },
        other => other,
    })?;

    let status = if hashed.digest == record.digest {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Corrupted
    };

    Ok(DigestVerification {
        evidence_path: evidence_path.to_path_buf(),
        digest_path: digest_path.to_path_buf(),
        expected: record.digest,
        actual: hashed.digest,
        status,
    })
}
