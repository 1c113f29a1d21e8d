//! DynamoDB-backed `MetadataTable`.
//!
//! Items are flat: `imageId` (S, partition key), `caption` (S), `tags`
//! (L of S), `uploadTime` (N), `uploaderId` (S).

use super::{MetadataTable, StoreError, StoreResult};
use crate::models::image::ImageRecord;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::{
    Client, error::DisplayErrorContext, operation::scan::ScanOutput, types::AttributeValue,
};
use std::collections::HashMap;
use tracing::{debug, warn};

const IMAGE_ID: &str = "imageId";
const CAPTION: &str = "caption";
const TAGS: &str = "tags";
const UPLOAD_TIME: &str = "uploadTime";
const UPLOADER_ID: &str = "uploaderId";

type Item = HashMap<String, AttributeValue>;

pub struct DynamoMetadataTable {
    client: Client,
    table: String,
}

impl DynamoMetadataTable {
    pub fn new(sdk_config: &SdkConfig, table: impl Into<String>) -> Self {
        Self {
            client: Client::new(sdk_config),
            table: table.into(),
        }
    }
}

#[async_trait]
impl MetadataTable for DynamoMetadataTable {
    async fn put(&self, record: &ImageRecord) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_item(record)))
            .send()
            .await
            .map_err(|err| StoreError::MetadataTable(DisplayErrorContext(&err).to_string()))?;
        debug!(table = %self.table, key = %record.image_id, "put metadata record");
        Ok(())
    }

    async fn scan(&self) -> StoreResult<Vec<ImageRecord>> {
        let output = self
            .client
            .scan()
            .table_name(&self.table)
            .send()
            .await
            .map_err(|err| StoreError::MetadataTable(DisplayErrorContext(&err).to_string()))?;

        Ok(records_from_scan(&self.table, &output))
    }

    async fn delete(&self, image_id: &str) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key(IMAGE_ID, AttributeValue::S(image_id.to_string()))
            .send()
            .await
            .map_err(|err| StoreError::MetadataTable(DisplayErrorContext(&err).to_string()))?;
        debug!(table = %self.table, key = image_id, "deleted metadata record");
        Ok(())
    }
}

/// Records from one scan page. Later pages are not requested.
fn records_from_scan(table: &str, output: &ScanOutput) -> Vec<ImageRecord> {
    if output.last_evaluated_key().is_some() {
        warn!(
            table,
            returned = output.items().len(),
            "scan result truncated; later pages are not read"
        );
    }

    output
        .items()
        .iter()
        .filter_map(|item| match from_item(item) {
            Ok(record) => Some(record),
            Err(reason) => {
                warn!(table, %reason, "skipping malformed item");
                None
            }
        })
        .collect()
}

fn to_item(record: &ImageRecord) -> Item {
    let tags = record
        .tags
        .iter()
        .map(|tag| AttributeValue::S(tag.clone()))
        .collect();

    HashMap::from([
        (IMAGE_ID.to_string(), AttributeValue::S(record.image_id.clone())),
        (CAPTION.to_string(), AttributeValue::S(record.caption.clone())),
        (TAGS.to_string(), AttributeValue::L(tags)),
        (
            UPLOAD_TIME.to_string(),
            AttributeValue::N(record.upload_time.to_string()),
        ),
        (
            UPLOADER_ID.to_string(),
            AttributeValue::S(record.uploader_id.clone()),
        ),
    ])
}

/// Read an item back, defaulting every attribute except `imageId`.
fn from_item(item: &Item) -> Result<ImageRecord, String> {
    let image_id = match item.get(IMAGE_ID) {
        Some(AttributeValue::S(id)) => id.clone(),
        _ => return Err(format!("missing string attribute `{IMAGE_ID}`")),
    };

    let string_attr = |name: &str| match item.get(name) {
        Some(AttributeValue::S(value)) => value.clone(),
        _ => String::new(),
    };

    let tags = match item.get(TAGS) {
        Some(AttributeValue::L(values)) => values
            .iter()
            .filter_map(|value| match value {
                AttributeValue::S(tag) => Some(tag.clone()),
                _ => None,
            })
            .collect(),
        Some(AttributeValue::Ss(values)) => values.clone(),
        _ => Vec::new(),
    };

    let upload_time = match item.get(UPLOAD_TIME) {
        Some(AttributeValue::N(raw)) => parse_millis(raw)
            .ok_or_else(|| format!("`{UPLOAD_TIME}` of `{image_id}` is not a number: {raw}"))?,
        _ => 0,
    };

    Ok(ImageRecord {
        caption: string_attr(CAPTION),
        uploader_id: string_attr(UPLOADER_ID),
        image_id,
        tags,
        upload_time,
    })
}

fn parse_millis(raw: &str) -> Option<i64> {
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|value| value as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_layout_matches_the_table_schema() {
        let record = ImageRecord {
            image_id: "images/1718000000000-cat.png".into(),
            caption: "Cat".into(),
            tags: vec!["pets".into(), "cute".into()],
            upload_time: 1_718_000_000_123,
            uploader_id: "10.0.0.7".into(),
        };
        let item = to_item(&record);

        assert_eq!(
            item[IMAGE_ID],
            AttributeValue::S("images/1718000000000-cat.png".into())
        );
        assert_eq!(item[UPLOAD_TIME], AttributeValue::N("1718000000123".into()));
        assert_eq!(
            item[TAGS],
            AttributeValue::L(vec![
                AttributeValue::S("pets".into()),
                AttributeValue::S("cute".into()),
            ])
        );
        assert_eq!(from_item(&item).unwrap(), record);
    }

    #[test]
    fn sparse_items_fall_back_to_defaults() {
        let item = HashMap::from([(
            IMAGE_ID.to_string(),
            AttributeValue::S("images/1-a.png".into()),
        )]);
        let record = from_item(&item).unwrap();

        assert_eq!(record.caption, "");
        assert!(record.tags.is_empty());
        assert_eq!(record.upload_time, 0);
        assert_eq!(record.uploader_id, "");
    }

    #[test]
    fn string_sets_and_float_timestamps_are_accepted() {
        let item = HashMap::from([
            (IMAGE_ID.to_string(), AttributeValue::S("images/1-a.png".into())),
            (
                TAGS.to_string(),
                AttributeValue::Ss(vec!["beach".into(), "sun".into()]),
            ),
            (UPLOAD_TIME.to_string(), AttributeValue::N("1718000000000.0".into())),
        ]);
        let record = from_item(&item).unwrap();

        assert_eq!(record.tags, vec!["beach", "sun"]);
        assert_eq!(record.upload_time, 1_718_000_000_000);
    }

    #[test]
    fn items_without_an_id_are_rejected() {
        let item = HashMap::from([(CAPTION.to_string(), AttributeValue::S("orphan".into()))]);
        assert!(from_item(&item).is_err());
    }

    #[test]
    fn truncated_scan_keeps_the_first_page_only() {
        let first = ImageRecord {
            image_id: "images/1-a.png".into(),
            caption: "Beach".into(),
            tags: vec!["sun".into()],
            upload_time: 1,
            uploader_id: "10.0.0.1".into(),
        };
        let second = ImageRecord {
            image_id: "images/2-b.png".into(),
            caption: "Dog".into(),
            tags: Vec::new(),
            upload_time: 2,
            uploader_id: "10.0.0.2".into(),
        };
        let orphan = HashMap::from([(CAPTION.to_string(), AttributeValue::S("orphan".into()))]);

        let output = ScanOutput::builder()
            .items(to_item(&first))
            .items(orphan)
            .items(to_item(&second))
            .last_evaluated_key(IMAGE_ID, AttributeValue::S("images/2-b.png".into()))
            .build();

        assert!(output.last_evaluated_key().is_some());
        assert_eq!(records_from_scan("images", &output), vec![first, second]);
    }

    #[test]
    fn empty_scan_yields_no_records() {
        let output = ScanOutput::builder().build();
        assert!(records_from_scan("images", &output).is_empty());
    }
}
