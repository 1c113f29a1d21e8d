//! Liveness handlers.
//!
//! - GET /        -> plain-text banner
//! - GET /health  -> `{status: "OK", timestamp}`
//!
//! Neither touches the stores.

use crate::errors::AppError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub const BANNER: &str = "Image gateway API is running";

/// `GET /`
pub async fn root() -> &'static str {
    BANNER
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    )
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}
