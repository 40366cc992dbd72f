use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures_util::TryStreamExt;
use image::DynamicImage;
use resnet_imagenet::{ImageClassifier, Prediction};

use crate::error::ApiError;
use crate::types::{ClassifyResponse, ModelState, ServeBackend};

/// The one route of the service. Reads the `image` multipart field, decodes
/// it, runs the classifier on the blocking pool and answers with the top-1
/// label and its probability.
#[post("/classify")]
pub async fn classify(
    state: web::Data<ModelState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let model = match state.get_ref() {
        ModelState::Ready(model) => Arc::clone(model),
        ModelState::Unavailable(reason) => {
            log::warn!("rejecting request, model unavailable: {reason}");
            return Err(ApiError::ModelUnavailable);
        }
    };

    let bytes = read_image_field(payload)
        .await?
        .ok_or(ApiError::MissingImage)?;
    let image = image::load_from_memory(&bytes).map_err(ApiError::DecodeImage)?;

    let top = web::block(move || classify_image(&model, &image))
        .await
        .map_err(|_| ApiError::Canceled)??;

    Ok(HttpResponse::Ok().json(ClassifyResponse {
        class_name: top.label,
        confidence: top.score,
    }))
}

/// Collect the bytes of the `image` field, skipping any other fields.
async fn read_image_field(mut payload: Multipart) -> Result<Option<Vec<u8>>, ApiError> {
    while let Some(mut field) = payload.try_next().await? {
        if field.name() != Some("image") {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(bytes));
    }

    Ok(None)
}

fn classify_image(
    model: &ImageClassifier<ServeBackend>,
    image: &DynamicImage,
) -> Result<Prediction, ApiError> {
    model
        .classify(image)?
        .into_iter()
        .next()
        .ok_or(ApiError::EmptyOutput)
}
