use std::sync::Arc;

use burn::backend::NdArray;
use resnet_imagenet::ImageClassifier;
use serde::Serialize;

/// CPU backend the service runs inference on.
pub type ServeBackend = NdArray<f32>;

/// Outcome of the one-time startup model load, shared with every request.
///
/// The classifier is immutable after construction and its forward pass
/// borrows it, so `Ready` shares a plain `Arc` with no lock. A failed load
/// is kept as its reason string; requests hitting it are answered with
/// HTTP 500 before any inference is attempted.
pub enum ModelState {
    Ready(Arc<ImageClassifier<ServeBackend>>),
    Unavailable(String),
}

/// Body of a successful classification.
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub class_name: String,
    pub confidence: f32,
}

/// Body of every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
