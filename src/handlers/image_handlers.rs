//! HTTP handlers for the image API.
//! Validation happens in the extractors; store failures are logged and
//! answered with a generic 500.

use super::extract::{ClientAddr, ValidatedJson};
use crate::{
    errors::AppError,
    models::{
        image::SearchHit,
        requests::{
            ActionResponse, DeleteImageRequest, PresignRequest, PresignedUpload,
            SaveMetadataRequest, SearchQuery,
        },
    },
    services::image_service::ImageService,
};
use axum::{
    Json,
    extract::{Query, State},
};

/// `POST /api/generate-presigned-url`
pub async fn generate_presigned_url(
    State(service): State<ImageService>,
    ValidatedJson(req): ValidatedJson<PresignRequest>,
) -> Result<Json<PresignedUpload>, AppError> {
    let upload = service
        .issue_upload(req.file_name(), req.file_type())
        .await
        .map_err(|err| AppError::operational("Failed to generate upload URL", &err))?;
    Ok(Json(upload))
}

/// `POST /api/save-metadata`
pub async fn save_metadata(
    State(service): State<ImageService>,
    ClientAddr(uploader): ClientAddr,
    ValidatedJson(req): ValidatedJson<SaveMetadataRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let key = req.key().to_string();
    service
        .record_metadata(&key, req.caption, req.tags, uploader)
        .await
        .map_err(|err| AppError::operational("Failed to save metadata", &err))?;
    Ok(Json(ActionResponse::ok("Metadata saved successfully")))
}

/// `GET /api/search?q=`
pub async fn search_images(
    State(service): State<ImageService>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    let hits = service
        .search(query.q.as_deref())
        .await
        .map_err(|err| AppError::operational("Failed to search images", &err))?;
    Ok(Json(hits))
}

/// `POST /api/delete-image`
pub async fn delete_image(
    State(service): State<ImageService>,
    ValidatedJson(req): ValidatedJson<DeleteImageRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    service
        .remove(req.key())
        .await
        .map_err(|err| AppError::operational("Failed to delete image", &err))?;
    Ok(Json(ActionResponse::ok("Image deleted successfully")))
}
