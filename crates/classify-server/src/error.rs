use actix_multipart::MultipartError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use resnet_imagenet::InferenceError;
use thiserror::Error;

use crate::types::ErrorBody;

/// Everything that can go wrong while answering `/classify`. Each variant
/// carries the exact message that ends up in the JSON `error` field.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no image supplied")]
    MissingImage,
    #[error("Failed to decode image")]
    DecodeImage(#[source] image::ImageError),
    #[error("malformed multipart payload: {0}")]
    Multipart(String),
    #[error("Model not loaded")]
    ModelUnavailable,
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("model returned no predictions")]
    EmptyOutput,
    #[error("classification task did not complete")]
    Canceled,
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingImage | ApiError::DecodeImage(_) | ApiError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ModelUnavailable
            | ApiError::Inference(_)
            | ApiError::EmptyOutput
            | ApiError::Canceled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("{self}");
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
