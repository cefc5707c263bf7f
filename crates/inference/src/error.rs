use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use schema::ErrorBody;
use thiserror::Error;

/// Every way a `/predict` request can fail, and the status each maps to.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid file type: {0}. Only JPEG and PNG are supported.")]
    InvalidFileType(String),

    #[error("Empty file received")]
    EmptyFile,

    #[error("No file uploaded: expected multipart field `{}`", schema::UPLOAD_FIELD)]
    MissingFile,

    #[error("Upload exceeds the {limit}-byte limit")]
    TooLarge { limit: usize },

    #[error("Malformed multipart upload: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Cannot identify image file: {0}")]
    Decode(image::ImageError),

    #[error("Server error: {0:#}")]
    Inference(anyhow::Error),

    #[error("Server error: failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("Server error: {0}")]
    TaskFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidFileType(_)
            | ApiError::EmptyFile
            | ApiError::MissingFile
            | ApiError::Decode(_) => StatusCode::BAD_REQUEST,
            ApiError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Multipart { status, .. } => *status,
            ApiError::Inference(_) | ApiError::Encode(_) | ApiError::TaskFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Multipart read failure; a body over `limit` bytes is reported as such.
    pub fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::TooLarge { limit };
        }
        ApiError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Multipart {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %detail, "Server error");
        } else {
            tracing::error!(status = status.as_u16(), %detail, "Rejected request");
        }

        (status, Json(ErrorBody::new(detail))).into_response()
    }
}
