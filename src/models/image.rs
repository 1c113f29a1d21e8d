//! Represents an uploaded image as indexed in the metadata table.

use serde::{Deserialize, Serialize};

/// Flat metadata record for one uploaded object.
///
/// `image_id` is the object store key and the table's partition key. Records
/// are never updated in place; saving the same key again replaces the record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Object key, e.g. `images/1718000000000-cat-pic.png`.
    pub image_id: String,

    /// Free text, empty when the client sent none.
    pub caption: String,

    /// User tags in the order they were submitted.
    pub tags: Vec<String>,

    /// Epoch millis at metadata write time.
    pub upload_time: i64,

    /// Network address of the caller that saved the record.
    pub uploader_id: String,
}

impl ImageRecord {
    /// Case-insensitive substring match of an already lower-cased term
    /// against the caption or any tag.
    pub fn matches(&self, term: &str) -> bool {
        self.caption.to_lowercase().contains(term)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(term))
    }
}

/// One element of the search response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub key: String,
    pub caption: String,
    pub tags: Vec<String>,
    pub upload_time: i64,
    /// Public-style object URL; built by interpolation, not signed.
    pub presigned_get_url: String,
}

impl SearchHit {
    pub fn from_record(record: ImageRecord, url_base: &str) -> Self {
        let presigned_get_url = format!("{}/{}", url_base, record.image_id);
        Self {
            key: record.image_id,
            caption: record.caption,
            tags: record.tags,
            upload_time: record.upload_time,
            presigned_get_url,
        }
    }
}
