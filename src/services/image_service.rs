//! ImageService: the four gateway operations.
//!
//! Every operation is one or two calls to the injected stores. Nothing is
//! cached, retried or coordinated here; concurrent writes to one key race at
//! the store and the last write wins.

use super::{MetadataTable, ObjectStore, StoreResult, UploadPolicy};
use crate::models::{
    image::{ImageRecord, SearchHit},
    requests::PresignedUpload,
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Largest upload the presigned POST allows (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Lifetime of an upload authorization.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(300);

const KEY_PREFIX: &str = "images/";

#[derive(Clone)]
pub struct ImageService {
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataTable>,
    /// `https://<bucket>.s3.<region>.amazonaws.com`, without trailing slash.
    public_url_base: Arc<str>,
}

impl ImageService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataTable>,
        public_url_base: impl Into<String>,
    ) -> Self {
        let base: String = public_url_base.into();
        Self {
            objects,
            metadata,
            public_url_base: Arc::from(base.trim_end_matches('/')),
        }
    }

    /// Generate a fresh key for `file_name` and authorize a direct upload to it.
    ///
    /// `file_type` is only logged; the policy carries no content-type condition.
    pub async fn issue_upload(
        &self,
        file_name: &str,
        file_type: &str,
    ) -> StoreResult<PresignedUpload> {
        let key = object_key(file_name, Utc::now().timestamp_millis());
        let policy = UploadPolicy {
            max_bytes: MAX_UPLOAD_BYTES,
            expires_in: UPLOAD_URL_TTL,
        };

        let auth = self.objects.authorize_upload(&key, policy).await?;
        debug!(%key, file_type, "issued upload authorization");

        Ok(PresignedUpload {
            url: auth.url,
            fields: auth.fields,
            key,
        })
    }

    /// Write the metadata record for `key`, replacing any previous one.
    pub async fn record_metadata(
        &self,
        key: &str,
        caption: Option<String>,
        tags: Option<Vec<String>>,
        uploader_id: String,
    ) -> StoreResult<ImageRecord> {
        let record = ImageRecord {
            image_id: key.to_string(),
            caption: caption.unwrap_or_default(),
            tags: tags.unwrap_or_default(),
            upload_time: Utc::now().timestamp_millis(),
            uploader_id,
        };

        self.metadata.put(&record).await?;
        info!(key, uploader = %record.uploader_id, "saved image metadata");
        Ok(record)
    }

    /// Scan every record and keep those matching `query`.
    ///
    /// A blank or absent query returns everything. Otherwise the trimmed,
    /// lower-cased query must be a substring of the caption or of any tag.
    pub async fn search(&self, query: Option<&str>) -> StoreResult<Vec<SearchHit>> {
        let records = self.metadata.scan().await?;
        let term = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let hits: Vec<SearchHit> = records
            .into_iter()
            .filter(|record| term.as_deref().is_none_or(|t| record.matches(t)))
            .map(|record| SearchHit::from_record(record, &self.public_url_base))
            .collect();

        debug!(query = ?term, hits = hits.len(), "search complete");
        Ok(hits)
    }

    /// Delete the object, then its metadata record.
    ///
    /// The two deletes are independent: a failure of the second leaves the
    /// record orphaned, and a failure of the first skips the second.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        self.objects.delete_object(key).await?;
        self.metadata.delete(key).await?;
        info!(key, "deleted image");
        Ok(())
    }
}

/// `images/<millis>-<file name>` with each whitespace run replaced by `-`.
pub fn object_key(file_name: &str, millis: i64) -> String {
    format!("{KEY_PREFIX}{millis}-{}", sanitize_file_name(file_name))
}

fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}
