//! Exit codes following sysexits.h conventions.

use intake_core::{ErrorKind, IntakeError};

/// Successful execution.
pub const SUCCESS: u8 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: u8 = 1;

/// Invalid operator input or configuration.
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: u8 = 64;

/// Stored evidence no longer matches its digest, or the digest file
/// is not a digest record.
/// Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FAILED: u8 = 65;

/// Evidence file unreadable or truncated.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: u8 = 66;

/// Remote store rejected the upload or could not be reached.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UPLOAD_ERROR: u8 = 69;

/// Case directory or file could not be created.
/// Maps to EX_CANTCREAT from sysexits.h.
pub const FILESYSTEM_ERROR: u8 = 73;

pub fn for_intake_error(err: &IntakeError) -> u8 {
    match err.kind() {
        ErrorKind::FilesystemError => FILESYSTEM_ERROR,
        ErrorKind::IOError => INPUT_ERROR,
        ErrorKind::UploadError => UPLOAD_ERROR,
        ErrorKind::InvalidInput => USAGE_ERROR,
        ErrorKind::DataError => VERIFICATION_FAILED,
    }
}

/// Classify an error chain, preferring the intake error inside it
pub fn for_anyhow(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<IntakeError>() {
        Some(intake) => for_intake_error(intake),
        None => GENERAL_ERROR,
    }
}
