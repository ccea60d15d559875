//! Store and base-directory settings from flags and environment

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use intake_core::{ExistingCasePolicy, IntakeError, IntakeOptions, S3Config, StoreConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// AWS S3 or an S3-compatible endpoint
    S3,
    /// Mirror objects into a local directory
    Local,
    /// Keep objects in memory (dry run)
    Memory,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Where evidence and digests are uploaded
    #[arg(long, value_enum, env = "INTAKE_STORE", default_value = "s3", global = true)]
    pub store: StoreKind,

    /// S3 bucket receiving case objects
    #[arg(long, env = "INTAKE_BUCKET", global = true)]
    pub bucket: Option<String>,

    /// AWS region of the bucket
    #[arg(long, env = "INTAKE_REGION", default_value = "us-east-1", global = true)]
    pub region: String,

    /// Custom S3 endpoint (MinIO, R2, ...)
    #[arg(long, env = "INTAKE_S3_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, global = true)]
    pub path_style: bool,

    /// Target directory for --store local
    #[arg(long, env = "INTAKE_LOCAL_STORE_DIR", global = true)]
    pub local_store_dir: Option<PathBuf>,
}

impl StoreArgs {
    pub fn to_config(&self) -> Result<StoreConfig> {
        match self.store {
            StoreKind::S3 => {
                let Some(bucket) = self.bucket.clone() else {
                    bail!(IntakeError::InvalidCase(
                        "an S3 bucket is required (--bucket or INTAKE_BUCKET)".to_string()
                    ));
                };
                let mut config = S3Config::aws(bucket, self.region.clone());
                config.endpoint = self.endpoint.clone();
                config.force_path_style = self.path_style;
                Ok(StoreConfig::S3(config))
            }
            StoreKind::Local => match &self.local_store_dir {
                Some(path) => Ok(StoreConfig::local(path.clone())),
                None => bail!(IntakeError::InvalidCase(
                    "--local-store-dir is required with --store local".to_string()
                )),
            },
            StoreKind::Memory => Ok(StoreConfig::Memory),
        }
    }
}

/// Base directory and case policy
pub fn intake_options(base_dir: Option<PathBuf>, resume: bool) -> Result<IntakeOptions> {
    let mut options = match base_dir {
        Some(base_dir) => IntakeOptions {
            base_dir,
            policy: ExistingCasePolicy::Reject,
        },
        None => IntakeOptions::from_home()?,
    };
    if resume {
        options.policy = ExistingCasePolicy::Resume;
    }
    Ok(options)
}
