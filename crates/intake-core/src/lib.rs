use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub mod caselog;
pub mod digest;
pub mod error;
pub mod organizer;
pub mod pipeline;
pub mod store;

pub use caselog::CaseLog;
pub use digest::{
    hash_reader, read_and_hash, sha256_hex, verify_evidence, DigestRecord, DigestVerification, HashedEvidence,
    Sha256Hex, VerificationStatus,
};
pub use error::{ErrorKind, IntakeError, Result, Stage};
pub use organizer::{CaseLayout, ExistingCasePolicy, Organizer};
pub use pipeline::{IntakePipeline, PipelineState, UploadPlan};
pub use store::{LocalStore, MemoryStore, RemoteStore, S3Config, S3Store, StoreConfig, StoreError};

/// Prefix of every case directory and remote key
pub const CASE_PREFIX: &str = "case_";

/// Normalised case identifier, safe to use as a single path component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Normalise operator input into a case identifier.
    ///
    /// `5` becomes `case_005`, `case_042` is kept, other text gets the
    /// `case_` prefix. Input that is empty or could escape the case
    /// directory is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(IntakeError::InvalidCase("case number is empty".to_string()));
        }

        let id = if input.bytes().all(|b| b.is_ascii_digit()) {
            format!("{}{:0>3}", CASE_PREFIX, input)
        } else if input.starts_with(CASE_PREFIX) {
            input.to_string()
        } else {
            format!("{}{}", CASE_PREFIX, input)
        };

        let unsafe_char = id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());
        if unsafe_char || id.contains("..") || id.len() == CASE_PREFIX.len() {
            return Err(IntakeError::InvalidCase(format!(
                "case number {:?} cannot be used as a directory name",
                input
            )));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case metadata collected from the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub investigator: String,
    pub victim: String,
    pub suspect: String,
    pub crime_type: String,
}

/// Coarse evidence type derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceCategory {
    Image,
    Video,
    Document,
    Archive,
    Unknown,
}

impl EvidenceCategory {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" => Self::Image,
            "mp4" | "avi" | "mov" | "wmv" | "mkv" => Self::Video,
            "pdf" | "doc" | "docx" | "txt" => Self::Document,
            "zip" | "rar" | "7z" => Self::Archive,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for EvidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceProfile {
    pub name: String,
    pub size: u64,
    pub category: EvidenceCategory,
}

impl EvidenceProfile {
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

/// Final record of a completed intake run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeReport {
    pub run_id: Uuid,
    pub case: Case,
    pub evidence: EvidenceProfile,
    pub sha256: Sha256Hex,
    pub evidence_path: PathBuf,
    pub digest_path: PathBuf,
    pub case_log: PathBuf,
    pub store: String,
    pub uploaded_keys: Vec<String>,
    pub state: PipelineState,
    pub completed_at: DateTime<Utc>,
}

/// Settings for one intake run
#[derive(Debug, Clone)]
pub struct IntakeOptions {
    /// Directory that holds `forensics/`
    pub base_dir: PathBuf,
    pub policy: ExistingCasePolicy,
}

impl IntakeOptions {
    /// Base directory under the operator's home, rejecting existing cases
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(IntakeError::NoHomeDirectory)?;
        Ok(Self {
            base_dir: home,
            policy: ExistingCasePolicy::Reject,
        })
    }
}

/// Organize the case, then hash, store and upload one evidence file.
///
/// Failures are appended to the case log once the log exists; local files
/// written before the failure are left in place.
pub fn run_intake<S: RemoteStore>(
    case: &Case,
    source: &Path,
    options: &IntakeOptions,
    store: S,
) -> Result<IntakeReport> {
    tracing::info!("Starting intake of {} for {}", source.display(), case.id);

    let organizer = Organizer::new(&options.base_dir, options.policy);
    let (layout, log) = organizer.prepare(case, Uuid::new_v4())?;

    let mut pipeline = IntakePipeline::new(&organizer, &layout, &log, store);
    match pipeline.run(case, source) {
        Ok(report) => Ok(report),
        Err(e) => {
            tracing::warn!("Intake of {} failed at {}: {}", case.id, e.stage(), e);
            if let Err(log_err) = log.stage_failed(&e) {
                tracing::warn!("Could not record failure in {}: {}", log.path().display(), log_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_id_normalisation() {
        assert_eq!(CaseId::parse("5").unwrap().as_str(), "case_005");
        assert_eq!(CaseId::parse(" 001 ").unwrap().as_str(), "case_001");
        assert_eq!(CaseId::parse("1234").unwrap().as_str(), "case_1234");
        assert_eq!(CaseId::parse("case_042").unwrap().as_str(), "case_042");
        assert_eq!(CaseId::parse("2026-ABC").unwrap().as_str(), "case_2026-ABC");
    }

    #[test]
    fn test_case_id_rejects_unsafe_input() {
        for input in ["", "   ", "../etc", "a/b", "a\\b", "case_", "x\u{7}y"] {
            assert!(CaseId::parse(input).is_err(), "{:?} should be rejected", input);
        }
    }

    #[test]
    fn test_evidence_category() {
        assert_eq!(EvidenceCategory::from_path(Path::new("a.JPG")), EvidenceCategory::Image);
        assert_eq!(EvidenceCategory::from_path(Path::new("clip.mkv")), EvidenceCategory::Video);
        assert_eq!(EvidenceCategory::from_path(Path::new("notes.txt")), EvidenceCategory::Document);
        assert_eq!(EvidenceCategory::from_path(Path::new("dump.7z")), EvidenceCategory::Archive);
        assert_eq!(EvidenceCategory::from_path(Path::new("disk.img")), EvidenceCategory::Unknown);
        assert_eq!(EvidenceCategory::from_path(Path::new("noext")), EvidenceCategory::Unknown);
    }
}
