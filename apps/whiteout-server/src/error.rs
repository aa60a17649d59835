//! Error types for the whiteout server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use whiteout_core::WhiteoutError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    #[error(transparent)]
    Processing(#[from] WhiteoutError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Processing(_) | ServerError::Internal(_) => {
                tracing::error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
