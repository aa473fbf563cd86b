//! Error types for finflow-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use finflow_core::{CoreError, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(e) => match e.code() {
                ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorCode::AuthRejected => StatusCode::UNAUTHORIZED,
                ErrorCode::AuthUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::UnsupportedFileType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorCode::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
                ErrorCode::UploadInProgress => StatusCode::CONFLICT,
                ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
                ErrorCode::UploadRejected
                | ErrorCode::Transport
                | ErrorCode::InvalidResponse
                | ErrorCode::FetchFailed => StatusCode::BAD_GATEWAY,
                ErrorCode::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Core(e) => serde_json::json!({ "error": e.to_details() }),
            other => serde_json::json!({ "error": { "message": other.to_string() } }),
        };
        (status, Json(body)).into_response()
    }
}
