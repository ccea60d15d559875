//! End-to-end intake runs against in-memory and directory-backed stores

use intake_core::{
    run_intake, verify_evidence, Case, CaseId, ErrorKind, ExistingCasePolicy, IntakeError,
    IntakeOptions, IntakePipeline, LocalStore, MemoryStore, Organizer, PipelineState, Stage,
    VerificationStatus,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn test_case(number: &str) -> Case {
    Case {
        id: CaseId::parse(number).unwrap(),
        investigator: "Det. Okafor".to_string(),
        victim: "Northwind Ltd".to_string(),
        suspect: "J. Doe".to_string(),
        crime_type: "Data theft".to_string(),
    }
}

fn options(base: &Path) -> IntakeOptions {
    IntakeOptions {
        base_dir: base.to_path_buf(),
        policy: ExistingCasePolicy::Reject,
    }
}

fn write_source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join("source").join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, data).unwrap();
    path
}

fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn test_hello_scenario_layout_and_digest() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path(), "evidence.txt", b"hello");
    let store = MemoryStore::new();

    let report = run_intake(&test_case("001"), &source, &options(temp_dir.path()), &store).unwrap();

    let case_root = temp_dir.path().join("forensics/case_001");
    let evidence = case_root.join("evidence/evidence.txt");
    let digest = case_root.join("hashes/evidence.txt.sha256");
    let log = case_root.join("logs/case_info.txt");

    assert_eq!(fs::read(&evidence).unwrap(), b"hello");
    assert_eq!(
        fs::read_to_string(&digest).unwrap(),
        format!("{}  evidence.txt\n", HELLO_SHA256)
    );
    assert!(log.is_file());

    assert_eq!(report.sha256.as_str(), HELLO_SHA256);
    assert_eq!(report.state, PipelineState::Uploaded);
    assert_eq!(report.evidence_path, evidence);
    assert_eq!(report.digest_path, digest);

    // Source is copied, never moved
    assert_eq!(fs::read(&source).unwrap(), b"hello");
}

#[test]
fn test_uploaded_objects_match_hashed_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    let source = write_source(temp_dir.path(), "memory.dmp", &payload);
    let store = MemoryStore::new();

    let report = run_intake(&test_case("12"), &source, &options(temp_dir.path()), &store).unwrap();

    let fetched = store.get("case_012/evidence/memory.dmp").unwrap();
    assert_eq!(fetched.as_ref(), payload.as_slice());
    assert_eq!(intake_core::sha256_hex(&fetched), report.sha256);

    let digest_object = store.get("case_012/hashes/memory.dmp.sha256").unwrap();
    let local_digest = fs::read(&report.digest_path).unwrap();
    assert_eq!(digest_object.as_ref(), local_digest.as_slice());

    assert_eq!(
        report.uploaded_keys,
        vec![
            "case_012/evidence/memory.dmp".to_string(),
            "case_012/hashes/memory.dmp.sha256".to_string(),
        ]
    );
}

#[test]
fn test_digest_upload_failure_leaves_stored_local() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path(), "evidence.txt", b"hello");
    let case = test_case("001");

    let store = MemoryStore::new();
    store.fail_on("case_001/hashes/evidence.txt.sha256");

    let organizer = Organizer::new(temp_dir.path(), ExistingCasePolicy::Reject);
    let (layout, log) = organizer.prepare(&case, Uuid::new_v4()).unwrap();
    let mut pipeline = IntakePipeline::new(&organizer, &layout, &log, &store);

    let err = pipeline.run(&case, &source).unwrap_err();

    assert_eq!(pipeline.state(), PipelineState::StoredLocal);
    assert_eq!(err.kind(), ErrorKind::UploadError);
    assert_eq!(err.stage(), Stage::UploadDigest);
    assert_eq!(err.failed_key(), Some("case_001/hashes/evidence.txt.sha256"));

    assert!(store.contains("case_001/evidence/evidence.txt"));
    assert!(!store.contains("case_001/hashes/evidence.txt.sha256"));
    assert_eq!(pipeline.uploaded_keys(), ["case_001/evidence/evidence.txt".to_string()]);

    // Local copies remain as the recovery path
    assert!(layout.evidence_path("evidence.txt").is_file());
    assert!(layout.digest_path("evidence.txt").is_file());
}

#[test]
fn test_failure_is_recorded_in_case_log() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path(), "evidence.txt", b"hello");
    let store = MemoryStore::new();
    store.fail_on("case_001/hashes/evidence.txt.sha256");

    let err = run_intake(&test_case("1"), &source, &options(temp_dir.path()), &store).unwrap_err();
    assert_eq!(err.stage(), Stage::UploadDigest);

    let log = fs::read_to_string(temp_dir.path().join("forensics/case_001/logs/case_info.txt")).unwrap();
    assert!(log.contains("CASE case_001 OPENED"));
    assert!(log.contains("Uploaded case_001/evidence/evidence.txt"));
    assert!(log.contains("ERROR at upload-digest (UploadError)"));
    assert!(!log.contains("INTAKE COMPLETED"));
}

#[test]
fn test_missing_evidence_fails_at_hash_stage() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist.bin");
    let store = MemoryStore::new();

    let err = run_intake(&test_case("2"), &missing, &options(temp_dir.path()), &store).unwrap_err();

    assert!(matches!(err, IntakeError::Io { .. }));
    assert_eq!(err.kind(), ErrorKind::IOError);
    assert_eq!(err.stage(), Stage::Hash);

    let case_root = temp_dir.path().join("forensics/case_002");
    assert!(dir_is_empty(&case_root.join("evidence")));
    assert!(dir_is_empty(&case_root.join("hashes")));
    assert!(case_root.join("logs/case_info.txt").is_file());
    assert!(store.put_attempts().is_empty());
}

#[test]
fn test_second_intake_of_same_case_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path(), "evidence.txt", b"hello");

    run_intake(&test_case("5"), &source, &options(temp_dir.path()), MemoryStore::new()).unwrap();
    let before = fs::read_to_string(temp_dir.path().join("forensics/case_005/logs/case_info.txt")).unwrap();

    let err = run_intake(&test_case("5"), &source, &options(temp_dir.path()), MemoryStore::new())
        .unwrap_err();

    assert!(matches!(err, IntakeError::CaseExists { .. }));
    assert_eq!(err.kind(), ErrorKind::FilesystemError);
    let after = fs::read_to_string(temp_dir.path().join("forensics/case_005/logs/case_info.txt")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_resume_rewrites_identical_digest() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path(), "photo.jpg", b"\xFF\xD8\xFF\xE0jpeg");
    let mut opts = options(temp_dir.path());
    opts.policy = ExistingCasePolicy::Resume;

    let store = MemoryStore::new();
    store.fail_on("case_007/evidence/photo.jpg");
    assert!(run_intake(&test_case("7"), &source, &opts, &store).is_err());
    let digest_path = temp_dir.path().join("forensics/case_007/hashes/photo.jpg.sha256");
    let first = fs::read(&digest_path).unwrap();

    let report = run_intake(&test_case("7"), &source, &opts, MemoryStore::new()).unwrap();
    assert_eq!(report.state, PipelineState::Uploaded);
    assert_eq!(fs::read(&digest_path).unwrap(), first);
}

#[test]
fn test_resume_refuses_different_evidence_with_same_name() {
    let temp_dir = TempDir::new().unwrap();
    let mut opts = options(temp_dir.path());
    opts.policy = ExistingCasePolicy::Resume;

    let source = write_source(temp_dir.path(), "notes.txt", b"version one");
    run_intake(&test_case("8"), &source, &opts, MemoryStore::new()).unwrap();

    fs::write(&source, b"version two").unwrap();
    let err = run_intake(&test_case("8"), &source, &opts, MemoryStore::new()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FilesystemError);
    assert_eq!(err.stage(), Stage::StoreLocal);
    let kept = fs::read(temp_dir.path().join("forensics/case_008/evidence/notes.txt")).unwrap();
    assert_eq!(kept, b"version one");
}

#[test]
fn test_local_store_mirror_and_verification() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_source(temp_dir.path(), "evidence.txt", b"hello");
    let mirror = temp_dir.path().join("mirror");
    let store = LocalStore::new(&mirror);

    let report = run_intake(&test_case("1"), &source, &options(temp_dir.path()), &store).unwrap();

    assert_eq!(fs::read(mirror.join("case_001/evidence/evidence.txt")).unwrap(), b"hello");
    assert_eq!(
        fs::read_to_string(mirror.join("case_001/hashes/evidence.txt.sha256")).unwrap(),
        format!("{}  evidence.txt\n", HELLO_SHA256)
    );

    let verification = verify_evidence(&report.evidence_path, &report.digest_path).unwrap();
    assert_eq!(verification.status, VerificationStatus::Verified);
}
