//! Service layer: image orchestration plus the seams to the two external
//! stores (object storage and the metadata table).

pub mod dynamo;
pub mod image_service;
#[cfg(test)]
pub mod memory;
pub mod presign;
pub mod s3;

use crate::models::image::ImageRecord;
use async_trait::async_trait;
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object store request failed: {0}")]
    ObjectStore(String),
    #[error("metadata table request failed: {0}")]
    MetadataTable(String),
    #[error("credentials unavailable: {0}")]
    Credentials(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Limits baked into an upload authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Upper bound of the `content-length-range` condition; the lower bound is 0.
    pub max_bytes: u64,
    pub expires_in: Duration,
}

/// Form target and fields of a presigned POST.
#[derive(Debug, Clone)]
pub struct UploadAuthorization {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// Object storage the browser uploads into.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issue a presigned POST for `key` bounded by `policy`.
    async fn authorize_upload(
        &self,
        key: &str,
        policy: UploadPolicy,
    ) -> StoreResult<UploadAuthorization>;

    /// Delete the object at `key`. Missing objects are not an error.
    async fn delete_object(&self, key: &str) -> StoreResult<()>;
}

/// Key-value table holding one `ImageRecord` per object key.
#[async_trait]
pub trait MetadataTable: Send + Sync {
    /// Unconditional put; replaces any record with the same `image_id`.
    async fn put(&self, record: &ImageRecord) -> StoreResult<()>;

    /// Single unpaginated read of the whole table.
    async fn scan(&self) -> StoreResult<Vec<ImageRecord>>;

    async fn delete(&self, image_id: &str) -> StoreResult<()>;
}
