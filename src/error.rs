//! Request-boundary error type.
//!
//! Every failure a handler can hit ends up here and is rendered as a JSON body:
//! client mistakes as `{error}` with a 4xx status, everything else as
//! `{error, details}` with 500. Nothing is retried.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::llm::LLMError;
use crate::pdf::ExtractionError;
use crate::storage::StorageError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("File exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Could not extract text from PDF")]
    NoText,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Upstream(#[from] LLMError),

    #[error(transparent)]
    Storage(StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short label shown as `error` for server-side failures.
    fn label(&self) -> &'static str {
        match self {
            AppError::Extraction(_) | AppError::Upstream(_) => "Error processing chat request",
            AppError::Storage(_) | AppError::Io(_) => "Error uploading file",
            _ => "Internal server error",
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidFilename(_) | StorageError::UnsupportedType(_) => {
                AppError::Validation(err.to_string())
            }
            StorageError::TooLarge { limit } => AppError::PayloadTooLarge { limit },
            other => AppError::Storage(other),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::NoText => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_client_error() {
            HttpResponse::build(status).json(json!({ "error": self.to_string() }))
        } else {
            HttpResponse::build(status).json(json!({
                "error": self.label(),
                "details": self.to_string(),
            }))
        }
    }
}
