//! In-memory stores for tests. Both halves write to one shared journal so
//! tests can assert which external calls happened, and in what order.

use super::{
    MetadataTable, ObjectStore, StoreError, StoreResult, UploadAuthorization, UploadPolicy,
};
use crate::models::image::ImageRecord;
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct MemoryObjectStore {
    pub journal: Journal,
    pub fail: bool,
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn authorize_upload(
        &self,
        key: &str,
        policy: UploadPolicy,
    ) -> StoreResult<UploadAuthorization> {
        self.journal.lock().unwrap().push(format!("authorize {key}"));
        if self.fail {
            return Err(StoreError::Credentials("expired token".into()));
        }
        let fields = BTreeMap::from([
            ("key".to_string(), key.to_string()),
            ("max".to_string(), policy.max_bytes.to_string()),
            ("ttl".to_string(), policy.expires_in.as_secs().to_string()),
        ]);
        Ok(UploadAuthorization {
            url: "https://photos.s3.us-east-1.amazonaws.com/".into(),
            fields,
        })
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.journal.lock().unwrap().push(format!("delete object {key}"));
        if self.fail {
            return Err(StoreError::ObjectStore("AccessDenied".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMetadataTable {
    pub journal: Journal,
    pub records: Mutex<BTreeMap<String, ImageRecord>>,
    pub fail: bool,
}

#[async_trait]
impl MetadataTable for MemoryMetadataTable {
    async fn put(&self, record: &ImageRecord) -> StoreResult<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("put {}", record.image_id));
        if self.fail {
            return Err(StoreError::MetadataTable("ProvisionedThroughputExceeded".into()));
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.image_id.clone(), record.clone());
        Ok(())
    }

    async fn scan(&self) -> StoreResult<Vec<ImageRecord>> {
        self.journal.lock().unwrap().push("scan".into());
        if self.fail {
            return Err(StoreError::MetadataTable("ResourceNotFoundException".into()));
        }
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, image_id: &str) -> StoreResult<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("delete record {image_id}"));
        if self.fail {
            return Err(StoreError::MetadataTable("ConditionalCheckFailed".into()));
        }
        self.records.lock().unwrap().remove(image_id);
        Ok(())
    }
}

/// Shared-journal pair of stores.
pub fn stores(
    objects_fail: bool,
    metadata_fail: bool,
) -> (Arc<MemoryObjectStore>, Arc<MemoryMetadataTable>, Journal) {
    let journal = Journal::default();
    let objects = Arc::new(MemoryObjectStore {
        journal: journal.clone(),
        fail: objects_fail,
    });
    let metadata = Arc::new(MemoryMetadataTable {
        journal: journal.clone(),
        fail: metadata_fail,
        ..Default::default()
    });
    (objects, metadata, journal)
}
