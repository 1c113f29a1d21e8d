use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// One entry of the 400 `errors` array.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub location: &'static str,
}

impl FieldError {
    pub fn body(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            location: "body",
        }
    }
}

/// HTTP-facing error: either a list of field errors (400) or an
/// operational failure with a caller-safe message (500).
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl AppError {
    /// 400 carrying the field errors that caused it.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "validation failed".into(),
            errors,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
            errors: Vec::new(),
        }
    }

    /// 500 whose cause is logged here and never reaches the caller.
    pub fn operational(msg: impl Into<String>, cause: &dyn std::error::Error) -> Self {
        let msg = msg.into();
        tracing::error!(error = %cause, "{}", msg);
        Self::internal(msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
            errors: Vec::new(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.status == StatusCode::BAD_REQUEST {
            Json(json!({ "errors": self.errors }))
        } else {
            Json(json!({ "error": self.message }))
        };

        (self.status, body).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errs: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errs.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let errors = fields
            .into_iter()
            .flat_map(|(field, list)| {
                list.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid ({})", err.code));
                    FieldError::body(field, message)
                })
            })
            .collect();

        Self::validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: "Request body too large".into(),
                errors: Vec::new(),
            };
        }
        Self::validation(vec![FieldError::body("body", rejection.body_text())])
    }
}
