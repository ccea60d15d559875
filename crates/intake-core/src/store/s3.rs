//! S3-compatible store backend.
//!
//! Compatible with AWS S3, MinIO, R2, etc. The client is async; the store
//! owns a current-thread runtime and blocks on each request so the intake
//! pipeline stays strictly sequential.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Builder, Region},
    error::{DisplayErrorContext, SdkError},
    operation::put_object::PutObjectError,
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use tokio::runtime::Runtime;

use super::backend::{RemoteStore, StoreError, StoreResult};

/// S3 store configuration
#[derive(Clone, Debug)]
pub struct S3Config {
    /// S3 bucket name; object keys are the pipeline keys unchanged
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Custom endpoint URL (for MinIO, R2, etc.)
    pub endpoint: Option<String>,
    /// Force path-style URLs (required for MinIO)
    pub force_path_style: bool,
}

impl S3Config {
    /// Create config for AWS S3
    pub fn aws(bucket: String, region: String) -> Self {
        Self {
            bucket,
            region,
            endpoint: None,
            force_path_style: false,
        }
    }

    /// Human-readable bucket location for reports and the case log
    pub fn location(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("s3://{}", self.bucket),
        }
    }
}

/// S3-compatible store
pub struct S3Store {
    runtime: Runtime,
    client: Client,
    config: S3Config,
}

impl S3Store {
    /// Create a store using the AWS default credential chain
    /// (environment, shared profile, instance metadata)
    pub fn new(config: S3Config) -> StoreResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let client = runtime.block_on(async {
            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .load()
                .await;

            let mut builder = Builder::from(&sdk_config).force_path_style(config.force_path_style);
            if let Some(endpoint) = &config.endpoint {
                builder = builder.endpoint_url(endpoint);
            }

            Client::from_conf(builder.build())
        });

        Ok(Self {
            runtime,
            client,
            config,
        })
    }
}

fn classify_put_error(err: SdkError<PutObjectError>) -> StoreError {
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => StoreError::Unreachable(detail),
        _ => StoreError::Rejected(detail),
    }
}

impl RemoteStore for S3Store {
    fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        let len = data.len();

        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.config.bucket)
                    .key(key)
                    .body(ByteStream::from(data))
                    .send(),
            )
            .map_err(classify_put_error)?;

        tracing::debug!("Uploaded {} bytes to s3://{}/{}", len, self.config.bucket, key);
        Ok(())
    }

    fn location(&self) -> String {
        self.config.location()
    }
}
