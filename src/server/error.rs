//! HTTP error type
//!
//! Every failure leaves the service as `{"error": "<message>"}`.

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::sample::SampleError;
use crate::stegsolve::StegsolveError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Keep the status an extractor chose, but answer in our JSON shape
    fn from_rejection(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(message),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::UnsupportedMediaType(message),
            s if s.is_server_error() => ApiError::Internal(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<SampleError> for ApiError {
    fn from(err: SampleError) -> Self {
        match err {
            SampleError::InvalidKey(_) | SampleError::InvalidBase64(_) => {
                ApiError::BadRequest(err.to_string())
            }
            SampleError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SampleError::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StegsolveError> for ApiError {
    fn from(_: StegsolveError) -> Self {
        ApiError::BadRequest("Invalid image format".to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::from_rejection(err.status(), err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        ApiError::from_rejection(err.status(), err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::from_rejection(err.status(), err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::from_rejection(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_errors_map_to_status() {
        let err: ApiError = SampleError::NotFound("a.png".to_string()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = SampleError::InvalidKey("../a".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let io = std::io::Error::other("disk full");
        let err: ApiError = SampleError::Io(io).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rejection_status_is_kept() {
        let err = ApiError::from_rejection(StatusCode::PAYLOAD_TOO_LARGE, "too big".to_string());
        assert!(matches!(err, ApiError::PayloadTooLarge(_)));

        let err = ApiError::from_rejection(StatusCode::UNSUPPORTED_MEDIA_TYPE, "json".to_string());
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let err = ApiError::from_rejection(StatusCode::UNPROCESSABLE_ENTITY, "bad".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn test_stegsolve_error_message() {
        let err: ApiError = StegsolveError::InvalidImage("bad magic".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid image format");
    }
}
