use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use y_types::{ErrorResponse, FriendCodeError};

use crate::db::connection::is_transient_sqlite;
use crate::db::TransientError;
use crate::friendship::FriendshipError;
use crate::images::UploadError;
use crate::session::SessionError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message sent back when the database stayed unreachable after retries
pub const RETRY_MESSAGE: &str = "Lost connection to DB. Retry request.";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// A transient database failure outlasted the retry budget
    Retryable(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message, retry) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg, false),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg, false),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg, false),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", msg, false),
            ApiError::Retryable(msg) => {
                tracing::warn!("Giving up on transient database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    RETRY_MESSAGE.to_string(),
                    true,
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    false,
                )
            }
        };

        let error_response = ErrorResponse {
            error: error.to_string(),
            message: Some(message),
            retry,
        };

        (status, Json(error_response)).into_response()
    }
}

impl TransientError for ApiError {
    fn is_transient(&self) -> bool {
        matches!(self, ApiError::Retryable(_))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if err.is_transient() {
            ApiError::Retryable(format!("{:#}", err))
        } else {
            ApiError::InternalError(format!("{:#}", err))
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        if is_transient_sqlite(&err) {
            ApiError::Retryable(err.to_string())
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

impl From<FriendshipError> for ApiError {
    fn from(err: FriendshipError) -> Self {
        match err {
            FriendshipError::Storage(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => ApiError::Unauthorized("Missing or invalid session token".to_string()),
            SessionError::Expired => ApiError::Unauthorized("Token has expired".to_string()),
            SessionError::Storage(e) => e.into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        if let UploadError::Malformed(detail) = &err {
            tracing::debug!("Rejected multipart body: {}", detail);
        }
        ApiError::BadRequest(err.to_string())
    }
}

impl From<FriendCodeError> for ApiError {
    fn from(err: FriendCodeError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
