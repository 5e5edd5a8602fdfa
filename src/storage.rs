use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::SyncError;

/// Seven days, the S3 presigning maximum.
const IMAGE_REF_TTL_SECS: u64 = 7 * 24 * 3600;

/// Stores a captured image and hands back the reference kept on the record.
/// Upload failures degrade the record to "no image", they never fail a capture.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(
        &self,
        owner: Option<Uuid>,
        body: Bytes,
        content_type: &str,
    ) -> Result<String, SyncError>;
}

/// S3/MinIO-backed image store.
#[derive(Clone)]
pub struct S3ImageStore {
    client: Client,
    bucket: String,
}

impl S3ImageStore {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(
        &self,
        owner: Option<Uuid>,
        body: Bytes,
        content_type: &str,
    ) -> Result<String, SyncError> {
        let prefix = owner
            .map(|o| o.to_string())
            .unwrap_or_else(|| "anonymous".into());
        let key = format!("{}/{}.img", prefix, Uuid::new_v4());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(
                PresigningConfig::expires_in(std::time::Duration::from_secs(IMAGE_REF_TTL_SECS))
                    .map_err(|e| SyncError::Storage(e.to_string()))?,
            )
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}
