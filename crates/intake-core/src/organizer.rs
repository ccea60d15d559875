//! Case directory layout
//!
//! Every case lives under `<base>/forensics/<case-id>/` with three fixed
//! subdirectories:
//!
//! ```text
//! forensics/<case-id>/evidence/<filename>
//! forensics/<case-id>/hashes/<filename>.sha256
//! forensics/<case-id>/logs/case_info.txt
//! ```

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::caselog::CaseLog;
use crate::digest::{sha256_hex, DigestRecord};
use crate::error::{IntakeError, Result, Stage};
use crate::{Case, CaseId};

/// Top-level directory below the base directory
pub const FORENSICS_DIR: &str = "forensics";
pub const EVIDENCE_DIR: &str = "evidence";
pub const HASHES_DIR: &str = "hashes";
pub const LOGS_DIR: &str = "logs";

/// What to do when the case directory already has content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExistingCasePolicy {
    /// Fail rather than touch another run's files
    #[default]
    Reject,
    /// Reuse the directory; identical evidence may be placed again
    Resume,
}

/// Resolved paths of one case directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLayout {
    pub case_id: CaseId,
    pub root: PathBuf,
    pub evidence_dir: PathBuf,
    pub hashes_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl CaseLayout {
    pub fn new(base_dir: impl AsRef<Path>, case_id: &CaseId) -> Self {
        let root = base_dir
            .as_ref()
            .join(FORENSICS_DIR)
            .join(case_id.as_str());
        Self {
            case_id: case_id.clone(),
            evidence_dir: root.join(EVIDENCE_DIR),
            hashes_dir: root.join(HASHES_DIR),
            logs_dir: root.join(LOGS_DIR),
            root,
        }
    }

    pub fn evidence_path(&self, name: &str) -> PathBuf {
        self.evidence_dir.join(name)
    }

    pub fn digest_path(&self, name: &str) -> PathBuf {
        self.hashes_dir.join(DigestRecord::file_name_for(name))
    }
}

/// Evidence file name derived from the source path.
///
/// Names with control characters are refused so the digest record stays a
/// single line.
pub fn evidence_name(source: &Path) -> Result<String> {
    source
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .filter(|n| !n.chars().any(char::is_control))
        .map(String::from)
        .ok_or_else(|| {
            IntakeError::InvalidCase(format!(
                "{} does not name an evidence file",
                source.display()
            ))
        })
}

/// Creates case directories and places evidence copies
#[derive(Debug, Clone)]
pub struct Organizer {
    base_dir: PathBuf,
    policy: ExistingCasePolicy,
}

impl Organizer {
    pub fn new(base_dir: impl Into<PathBuf>, policy: ExistingCasePolicy) -> Self {
        Self {
            base_dir: base_dir.into(),
            policy,
        }
    }

    /// Create the case tree and append the case metadata to the case log
    pub fn prepare(&self, case: &Case, run_id: Uuid) -> Result<(CaseLayout, CaseLog)> {
        let layout = CaseLayout::new(&self.base_dir, &case.id);

        if self.policy == ExistingCasePolicy::Reject && dir_has_entries(&layout.root)? {
            return Err(IntakeError::CaseExists {
                stage: Stage::Organize,
                path: layout.root.clone(),
            });
        }

        for dir in [&layout.evidence_dir, &layout.hashes_dir, &layout.logs_dir] {
            fs::create_dir_all(dir).map_err(|e| IntakeError::filesystem(Stage::Organize, dir, e))?;
        }
        tracing::info!("Case directory ready: {}", layout.root.display());

        let log = CaseLog::new(&layout.logs_dir, run_id);
        log.case_opened(case)?;

        Ok((layout, log))
    }

    /// Write the evidence copy to `evidence/<name>`.
    ///
    /// An existing file is left untouched when its bytes are identical and
    /// is never overwritten otherwise.
    pub fn place_evidence(&self, layout: &CaseLayout, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let destination = layout.evidence_path(name);

        if destination.exists() {
            let existing = fs::read(&destination)
                .map_err(|e| IntakeError::filesystem(Stage::StoreLocal, &destination, e))?;
            if sha256_hex(&existing) == sha256_hex(bytes) {
                tracing::info!("Evidence already in place: {}", destination.display());
                return Ok(destination);
            }
            return Err(IntakeError::CaseExists {
                stage: Stage::StoreLocal,
                path: destination,
            });
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&destination)
            .map_err(|e| IntakeError::filesystem(Stage::StoreLocal, &destination, e))?;
        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| IntakeError::filesystem(Stage::StoreLocal, &destination, e))?;

        tracing::debug!("Wrote {} evidence bytes to {}", bytes.len(), destination.display());
        Ok(destination)
    }
}

fn dir_has_entries(path: &Path) -> Result<bool> {
    match fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(IntakeError::filesystem(Stage::Organize, path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use tempfile::TempDir;

    fn case(id: &str) -> Case {
        Case {
            id: CaseId::parse(id).unwrap(),
            investigator: "Investigator".to_string(),
            victim: "Victim".to_string(),
            suspect: "Suspect".to_string(),
            crime_type: "Fraud".to_string(),
        }
    }

    #[test]
    fn test_prepare_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let organizer = Organizer::new(temp_dir.path(), ExistingCasePolicy::Reject);

        let (layout, log) = organizer.prepare(&case("1"), Uuid::new_v4()).unwrap();

        let root = temp_dir.path().join("forensics").join("case_001");
        assert_eq!(layout.root, root);
        assert!(root.join("evidence").is_dir());
        assert!(root.join("hashes").is_dir());
        assert!(root.join("logs").is_dir());
        assert_eq!(log.path(), root.join("logs").join("case_info.txt"));
        assert!(log.path().is_file());
    }

    #[test]
    fn test_prepare_twice_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let organizer = Organizer::new(temp_dir.path(), ExistingCasePolicy::Reject);

        organizer.prepare(&case("1"), Uuid::new_v4()).unwrap();
        let err = organizer.prepare(&case("1"), Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, IntakeError::CaseExists { .. }));
        assert_eq!(err.kind(), ErrorKind::FilesystemError);
        assert_eq!(err.stage(), Stage::Organize);
    }

    #[test]
    fn test_empty_existing_directory_is_accepted() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("forensics/case_003")).unwrap();
        let organizer = Organizer::new(temp_dir.path(), ExistingCasePolicy::Reject);

        assert!(organizer.prepare(&case("3"), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_resume_appends_to_log() {
        let temp_dir = TempDir::new().unwrap();
        let organizer = Organizer::new(temp_dir.path(), ExistingCasePolicy::Resume);

        organizer.prepare(&case("9"), Uuid::new_v4()).unwrap();
        let (_, log) = organizer.prepare(&case("9"), Uuid::new_v4()).unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_unwritable_base_is_filesystem_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let organizer = Organizer::new(&blocker, ExistingCasePolicy::Reject);

        let err = organizer.prepare(&case("1"), Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FilesystemError);
    }

    #[test]
    fn test_place_evidence_never_clobbers() {
        let temp_dir = TempDir::new().unwrap();
        let organizer = Organizer::new(temp_dir.path(), ExistingCasePolicy::Resume);
        let (layout, _) = organizer.prepare(&case("4"), Uuid::new_v4()).unwrap();

        let path = organizer.place_evidence(&layout, "a.bin", b"original").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"original");

        // Identical bytes are a no-op
        organizer.place_evidence(&layout, "a.bin", b"original").unwrap();

        let err = organizer.place_evidence(&layout, "a.bin", b"changed").unwrap_err();
        assert!(matches!(err, IntakeError::CaseExists { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"original");
    }

    #[test]
    fn test_evidence_name() {
        assert_eq!(evidence_name(Path::new("/tmp/x/disk.img")).unwrap(), "disk.img");
        assert!(evidence_name(Path::new("/")).is_err());
        assert!(evidence_name(Path::new("..")).is_err());
    }

    #[test]
    fn test_evidence_name_rejects_line_breaks() {
        let err = evidence_name(Path::new("/tmp/two\nlines.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(evidence_name(Path::new("/tmp/tab\tname")).is_err());
    }
}
