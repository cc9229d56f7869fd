// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreedLensError {
    #[error("No image file provided")]
    MissingImage,

    #[error("{0}")]
    Upload(String),

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl BreedLensError {
    fn status(&self) -> StatusCode {
        match self {
            BreedLensError::MissingImage | BreedLensError::Upload(_) => StatusCode::BAD_REQUEST,
            BreedLensError::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            BreedLensError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for BreedLensError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Internal detail stays in the log, callers get a fixed message.
            BreedLensError::Internal(detail) => {
                error!("prediction request failed unexpectedly: {detail}");
                "Failed to process image".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status()).json(serde_json::json!({ "error": message }))
    }
}
