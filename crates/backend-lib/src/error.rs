// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::request::RequestError;

/// Errors surfaced at the HTTP boundary.
///
/// None of these carry a result code. Request and media type errors stop a
/// request before it reaches the dispatcher.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Response rendering failed: {0}")]
    Render(#[from] quick_xml::SeError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Request(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Request(RequestError::MalformedEnvelope(_)) => "REQ_001",
            AppError::Request(RequestError::MissingField(_)) => "REQ_002",
            AppError::Request(RequestError::UnknownOperation(_)) => "REQ_003",
            AppError::UnsupportedMediaType(_) => "MEDIA_001",
            AppError::Render(_) => "XML_001",
        }
    }

    /// Metric label for rejected requests
    pub fn rejection_reason(&self) -> &'static str {
        match self {
            AppError::Request(RequestError::MalformedEnvelope(_)) => "malformed",
            AppError::Request(RequestError::MissingField(_)) => "missing_field",
            AppError::Request(RequestError::UnknownOperation(_)) => "unknown_operation",
            AppError::UnsupportedMediaType(_) => "media_type",
            AppError::Render(_) => "render",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Request(RequestError::MalformedEnvelope(_)) => {
                "Expecting xml data".to_string()
            },
            // Field and type names come from the caller; safe to echo
            AppError::Request(e) => e.to_string(),
            AppError::UnsupportedMediaType(_) => "Expecting xml data".to_string(),
            AppError::Render(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
