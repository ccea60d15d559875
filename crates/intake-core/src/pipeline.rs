//! Integrity & upload pipeline
//!
//! Progress only moves forward: `Ingested → Hashed → StoredLocal → Uploaded`.
//! A failure freezes the pipeline at the last state it reached and records
//! the failing stage; nothing is rolled back and nothing is retried.

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::caselog::CaseLog;
use crate::digest::{read_and_hash, DigestRecord, HashedEvidence};
use crate::error::{IntakeError, Result, Stage};
use crate::organizer::{evidence_name, CaseLayout, Organizer};
use crate::store::RemoteStore;
use crate::{Case, CaseId, EvidenceCategory, EvidenceProfile, IntakeReport};

/// Progress of one evidence file through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineState {
    /// Case layout exists, evidence not yet read
    Ingested,
    /// Evidence read fully and digested
    Hashed,
    /// Evidence copy and digest file written locally
    StoredLocal,
    /// Evidence and digest acknowledged by the remote store
    Uploaded,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ingested => "Ingested",
            Self::Hashed => "Hashed",
            Self::StoredLocal => "Stored-Local",
            Self::Uploaded => "Uploaded",
        };
        f.write_str(name)
    }
}

/// Object keys for one evidence file, in upload order.
///
/// The evidence object is always put before its digest object, and the
/// digest is not attempted when the evidence upload fails, so the store
/// never holds a digest without the evidence it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPlan {
    pub evidence_key: String,
    pub digest_key: String,
}

impl UploadPlan {
    pub fn new(case_id: &CaseId, evidence_name: &str) -> Self {
        Self {
            evidence_key: format!("{}/evidence/{}", case_id, evidence_name),
            digest_key: format!(
                "{}/hashes/{}",
                case_id,
                DigestRecord::file_name_for(evidence_name)
            ),
        }
    }

    /// Keys paired with their stage, in the fixed upload order
    pub fn ordered(&self) -> [(Stage, &str); 2] {
        [
            (Stage::UploadEvidence, self.evidence_key.as_str()),
            (Stage::UploadDigest, self.digest_key.as_str()),
        ]
    }
}

/// Locally stored artifacts of one evidence file
#[derive(Debug, Clone)]
struct StoredEvidence {
    evidence_path: PathBuf,
    digest_path: PathBuf,
    digest_line: String,
}

/// Hash, store and upload one evidence file for a prepared case.
///
/// A pipeline runs once; after a failure the operator inspects the case
/// directory and starts a new run.
pub struct IntakePipeline<'a, S: RemoteStore> {
    organizer: &'a Organizer,
    layout: &'a CaseLayout,
    log: &'a CaseLog,
    store: S,
    state: PipelineState,
    failure: Option<Stage>,
    uploaded: Vec<String>,
}

impl<'a, S: RemoteStore> IntakePipeline<'a, S> {
    pub fn new(organizer: &'a Organizer, layout: &'a CaseLayout, log: &'a CaseLog, store: S) -> Self {
        Self {
            organizer,
            layout,
            log,
            store,
            state: PipelineState::Ingested,
            failure: None,
            uploaded: Vec::new(),
        }
    }

    /// Last state reached
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Stage that stopped the pipeline, if any
    pub fn failure(&self) -> Option<Stage> {
        self.failure
    }

    /// Keys the store acknowledged, in upload order
    pub fn uploaded_keys(&self) -> &[String] {
        &self.uploaded
    }

    /// Run every transition for `source`
    pub fn run(&mut self, case: &Case, source: &Path) -> Result<IntakeReport> {
        if self.state != PipelineState::Ingested || self.failure.is_some() {
            return Err(IntakeError::AlreadyRun);
        }

        let result = self.advance(case, source);
        if let Err(e) = &result {
            self.failure = Some(e.stage());
        }
        result
    }

    fn advance(&mut self, case: &Case, source: &Path) -> Result<IntakeReport> {
        let name = evidence_name(source)?;
        let hashed = self.hash(source)?;
        let profile = EvidenceProfile {
            name: name.clone(),
            size: hashed.size(),
            category: EvidenceCategory::from_path(source),
        };
        let stored = self.store_local(source, &profile, &hashed)?;
        self.upload(&name, hashed.bytes, &stored)?;

        Ok(IntakeReport {
            run_id: self.log.run_id(),
            case: case.clone(),
            evidence: profile,
            sha256: hashed.digest,
            evidence_path: stored.evidence_path,
            digest_path: stored.digest_path,
            case_log: self.log.path().to_path_buf(),
            store: self.store.location(),
            uploaded_keys: self.uploaded.clone(),
            state: self.state,
            completed_at: Utc::now(),
        })
    }

    /// `Ingested → Hashed`
    fn hash(&mut self, source: &Path) -> Result<HashedEvidence> {
        let hashed = read_and_hash(source)?;
        tracing::info!("Hashed {} ({} bytes): {}", source.display(), hashed.size(), hashed.digest);

        self.state = PipelineState::Hashed;
        Ok(hashed)
    }

    /// `Hashed → StoredLocal`; rewriting the digest file is idempotent
    fn store_local(
        &mut self,
        source: &Path,
        profile: &EvidenceProfile,
        hashed: &HashedEvidence,
    ) -> Result<StoredEvidence> {
        let evidence_path = self
            .organizer
            .place_evidence(self.layout, &profile.name, &hashed.bytes)?;
        self.log.evidence_placed(source, &evidence_path, profile)?;

        let digest_path = self.layout.digest_path(&profile.name);
        let digest_line = DigestRecord::new(hashed.digest.clone(), profile.name.clone()).to_line();
        std::fs::write(&digest_path, &digest_line)
            .map_err(|e| IntakeError::filesystem(Stage::StoreLocal, &digest_path, e))?;
        self.log.digest_written(&profile.name, hashed.digest.as_str())?;
        tracing::info!("Digest stored at {}", digest_path.display());

        self.state = PipelineState::StoredLocal;
        Ok(StoredEvidence {
            evidence_path,
            digest_path,
            digest_line,
        })
    }

    /// `StoredLocal → Uploaded`, evidence first.
    /// The evidence body is the buffer that was hashed and written locally.
    /// Once the store acknowledges a put, a case log write failure is only
    /// warned about, so state and keys always match what the store holds.
    fn upload(&mut self, name: &str, evidence: Vec<u8>, stored: &StoredEvidence) -> Result<()> {
        let plan = UploadPlan::new(&self.layout.case_id, name);
        let bodies = [
            Bytes::from(evidence),
            Bytes::from(stored.digest_line.clone().into_bytes()),
        ];
        let location = self.store.location();

        for ((stage, key), body) in plan.ordered().into_iter().zip(bodies) {
            tracing::info!("Uploading {} to {}", key, location);
            self.store.put(key, body).map_err(|err| IntakeError::Upload {
                stage,
                key: key.to_string(),
                source: err,
            })?;
            self.uploaded.push(key.to_string());
            if let Err(e) = self.log.object_uploaded(stage, &location, key) {
                tracing::warn!("{} uploaded but not recorded in case log: {}", key, e);
            }
        }

        self.state = PipelineState::Uploaded;
        if let Err(e) = self.log.run_completed(self.layout.case_id.as_str()) {
            tracing::warn!("Completion not recorded in case log: {}", e);
        }
        Ok(())
    }
}
