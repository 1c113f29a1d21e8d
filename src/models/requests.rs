//! JSON bodies accepted and returned by the `/api` handlers.
//!
//! Required fields are `Option`s so a missing field surfaces as a
//! validation error instead of a deserialization failure.

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::BTreeMap};
use validator::{Validate, ValidationError};

/// Body of `POST /api/generate-presigned-url`.
#[derive(Debug, Deserialize, Validate)]
pub struct PresignRequest {
    #[serde(rename = "fileName")]
    #[validate(required(message = "fileName is required"), custom = "not_blank")]
    pub file_name: Option<String>,

    /// Accepted but not enforced by the upload policy.
    #[serde(rename = "fileType")]
    #[validate(required(message = "fileType is required"), custom = "not_blank")]
    pub file_type: Option<String>,
}

impl PresignRequest {
    pub fn file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or_default()
    }

    pub fn file_type(&self) -> &str {
        self.file_type.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /api/save-metadata`.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveMetadataRequest {
    #[validate(required(message = "key is required"), custom = "not_blank")]
    pub key: Option<String>,

    pub caption: Option<String>,

    pub tags: Option<Vec<String>>,
}

impl SaveMetadataRequest {
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /api/delete-image`.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteImageRequest {
    #[validate(required(message = "key is required"), custom = "not_blank")]
    pub key: Option<String>,
}

impl DeleteImageRequest {
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or_default()
    }
}

/// Query string of `GET /api/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Presigned POST handed back to the browser, which uploads directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresignedUpload {
    /// Form action URL.
    pub url: String,
    /// Form fields to send ahead of the file part.
    pub fields: BTreeMap<String, String>,
    /// Object key the upload lands at; pass it to save-metadata.
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("value must not be empty"));
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_fail_validation() {
        let req: PresignRequest = serde_json::from_value(json!({ "fileType": "image/png" })).unwrap();
        let errs = req.validate().unwrap_err();

        assert!(errs.field_errors().contains_key("fileName"));
        assert!(!errs.field_errors().contains_key("fileType"));
    }

    #[test]
    fn blank_key_fails_validation() {
        let req: DeleteImageRequest = serde_json::from_value(json!({ "key": "   " })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn optional_metadata_fields_may_be_absent_or_null() {
        let req: SaveMetadataRequest =
            serde_json::from_value(json!({ "key": "images/1-a.png", "caption": null })).unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.key(), "images/1-a.png");
        assert!(req.caption.is_none());
        assert!(req.tags.is_none());
    }

    #[test]
    fn wrong_typed_tags_are_rejected_by_serde() {
        let parsed = serde_json::from_value::<SaveMetadataRequest>(
            json!({ "key": "images/1-a.png", "tags": "beach" }),
        );
        assert!(parsed.is_err());
    }
}
