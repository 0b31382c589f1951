//! Error handling for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Handler failure carrying a fixed client-facing message and the logged cause.
///
/// The cause never reaches the response body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest {
        message: &'static str,
        cause: anyhow::Error,
    },

    #[error("internal error: {message}")]
    Internal {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl AppError {
    /// Create a bad request error
    pub fn bad_request(message: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self::BadRequest {
            message,
            cause: cause.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message,
            cause: cause.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message rendered to the client
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::BadRequest { message, .. } | AppError::Internal { message, .. } => message,
        }
    }

    pub fn cause(&self) -> &anyhow::Error {
        match self {
            AppError::BadRequest { cause, .. } | AppError::Internal { cause, .. } => cause,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::now_v7();
        let status = self.status();

        tracing::error!(
            error_id = %error_id,
            status_code = %status.as_u16(),
            cause = %format!("{:#}", self.cause()),
            "{}",
            self.public_message()
        );

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
