//! Plain-text case log
//!
//! Every intake run appends timestamped lines to `logs/case_info.txt`.
//! The file is only ever opened in append mode, so entries from earlier
//! runs of the same case are preserved.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{IntakeError, Result, Stage};
use crate::{Case, EvidenceProfile};

/// Name of the case log inside the `logs/` directory
pub const CASE_LOG_FILE: &str = "case_info.txt";

/// Timestamp format of log lines
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appender for one case's log file
#[derive(Debug, Clone)]
pub struct CaseLog {
    path: PathBuf,
    run_id: Uuid,
}

impl CaseLog {
    /// Log inside an existing `logs/` directory
    pub fn new(logs_dir: impl AsRef<Path>, run_id: Uuid) -> Self {
        Self {
            path: logs_dir.as_ref().join(CASE_LOG_FILE),
            run_id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append one `[timestamp] message` line
    pub fn append(&self, stage: Stage, message: &str) -> Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let line = format!("[{}] {}\n", timestamp, message.replace('\n', " "));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| IntakeError::filesystem(stage, &self.path, e))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| IntakeError::filesystem(stage, &self.path, e))?;
        Ok(())
    }

    /// Case metadata entry written when the case layout is prepared
    pub fn case_opened(&self, case: &Case) -> Result<()> {
        self.append(
            Stage::Organize,
            &format!(
                "CASE {} OPENED | run {} | investigator: {} | victim: {} | suspect: {} | crime type: {}",
                case.id,
                self.run_id,
                case.investigator,
                case.victim,
                case.suspect,
                case.crime_type
            ),
        )
    }

    pub fn evidence_placed(&self, source: &Path, destination: &Path, profile: &EvidenceProfile) -> Result<()> {
        self.append(
            Stage::StoreLocal,
            &format!(
                "Evidence copied: {} -> {} ({} bytes, {})",
                source.display(),
                destination.display(),
                profile.size,
                profile.category
            ),
        )
    }

    pub fn digest_written(&self, name: &str, digest: &str) -> Result<()> {
        self.append(
            Stage::StoreLocal,
            &format!("SHA-256 for {}: {}", name, digest),
        )
    }

    pub fn object_uploaded(&self, stage: Stage, location: &str, key: &str) -> Result<()> {
        self.append(stage, &format!("Uploaded {} to {}", key, location))
    }

    pub fn stage_failed(&self, error: &IntakeError) -> Result<()> {
        self.append(
            error.stage(),
            &format!("ERROR at {} ({}): {}", error.stage(), error.kind(), error),
        )
    }

    pub fn run_completed(&self, case_id: &str) -> Result<()> {
        self.append(Stage::UploadDigest, &format!("CASE {} INTAKE COMPLETED", case_id))
    }
}
