//! S3-backed `ObjectStore`.
//!
//! Deletes go through the SDK client. Upload authorizations are presigned
//! POST policies signed locally with credentials resolved from the shared
//! provider, so no request reaches S3 when a URL is issued.

use super::{
    ObjectStore, StoreError, StoreResult, UploadAuthorization, UploadPolicy,
    presign::{SigningCredentials, post_policy_fields},
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sdk_s3::{Client, error::DisplayErrorContext};
use chrono::Utc;
use tracing::debug;

pub struct S3ObjectStore {
    client: Client,
    credentials: SharedCredentialsProvider,
    bucket: String,
    region: String,
    upload_url: String,
}

impl S3ObjectStore {
    /// Build the store from the process-wide SDK config.
    ///
    /// A custom `endpoint_url` (MinIO, LocalStack) switches to path-style
    /// addressing for both the client and the upload form URL.
    pub fn new(
        sdk_config: &SdkConfig,
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint_url: Option<&str>,
    ) -> StoreResult<Self> {
        let credentials = sdk_config.credentials_provider().ok_or_else(|| {
            StoreError::Credentials("no credentials provider configured".into())
        })?;

        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(endpoint_url.is_some())
            .build();

        let bucket = bucket.into();
        let region = region.into();
        let upload_url = upload_url(&bucket, &region, endpoint_url);

        Ok(Self {
            client: Client::from_conf(s3_config),
            credentials,
            bucket,
            region,
            upload_url,
        })
    }
}

/// Form action URL for presigned POSTs.
fn upload_url(bucket: &str, region: &str, endpoint_url: Option<&str>) -> String {
    match endpoint_url {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com/"),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn authorize_upload(
        &self,
        key: &str,
        policy: UploadPolicy,
    ) -> StoreResult<UploadAuthorization> {
        let creds = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|err| StoreError::Credentials(DisplayErrorContext(&err).to_string()))?;

        let signing = SigningCredentials {
            access_key_id: creds.access_key_id(),
            secret_access_key: creds.secret_access_key(),
            session_token: creds.session_token(),
        };
        let fields = post_policy_fields(
            &self.bucket,
            key,
            &self.region,
            &signing,
            policy,
            Utc::now(),
        );
        debug!(bucket = %self.bucket, key, "signed upload policy");

        Ok(UploadAuthorization {
            url: self.upload_url.clone(),
            fields,
        })
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StoreError::ObjectStore(DisplayErrorContext(&err).to_string()))?;
        debug!(bucket = %self.bucket, key, "deleted object");
        Ok(())
    }
}
