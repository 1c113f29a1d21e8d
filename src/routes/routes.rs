//! Defines routes for the image gateway.
//!
//! ## Structure
//! - **Image API**
//!   - `POST /api/generate-presigned-url` : issue a presigned POST and key
//!   - `POST /api/save-metadata`          : write the metadata record
//!   - `GET  /api/search?q=`              : scan and filter records
//!   - `POST /api/delete-image`           : delete object and record
//!
//! - **Liveness**
//!   - `GET /`       : banner
//!   - `GET /health` : status + timestamp
//!
//! `app` wraps the routes with the body limit, request tracing, CORS and
//! panic-to-500 layers.

use crate::{
    errors::AppError,
    handlers::{
        health_handlers::{health, not_found, root},
        image_handlers::{delete_image, generate_presigned_url, save_metadata, search_images},
    },
    services::image_service::ImageService,
};
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

/// Request bodies above this are rejected.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the router for all gateway routes.
///
/// The router carries shared state (`ImageService`) to all handlers.
pub fn routes() -> Router<ImageService> {
    Router::new()
        // liveness endpoints (mounted at root)
        .route("/", get(root))
        .route("/health", get(health))
        // image API
        .route("/api/generate-presigned-url", post(generate_presigned_url))
        .route("/api/save-metadata", post(save_metadata))
        .route("/api/search", get(search_images))
        .route("/api/delete-image", post(delete_image))
        .fallback(not_found)
}

/// Routes plus middleware, with state attached.
///
/// `allowed_origin` is the single origin CORS admits, with credentials.
pub fn app(service: ImageService, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("invalid CORS origin `{}`", allowed_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(routes()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response)))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "request handler panicked");
    AppError::internal("Internal server error").into_response()
}
