//! Pretrained ResNet-18 ImageNet classifier.
//!
//! Downloads and imports the published torchvision checkpoint, preprocesses
//! uploaded images into the tensor shape the network expects, and decodes the
//! forward pass into ranked label/probability pairs.

pub mod block;
pub mod classifier;
pub mod error;
pub mod imagenet;
pub mod model;
pub mod weights;

pub use classifier::{ImageClassifier, INPUT_SIDE, TOP_K};
pub use error::{InferenceError, LoadError};
pub use imagenet::Prediction;
pub use model::ResNet18;
