use burn::record::RecorderError;
use thiserror::Error;

/// Failure while obtaining a ready model. Fatal for the "model available"
/// state of the process; the caller decides whether to keep serving.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("failed to fetch model weights: {0}")]
	Fetch(#[from] std::io::Error),
	#[error("failed to import weight record: {0}")]
	Record(#[from] RecorderError),
}

/// Failure inside the forward/decode pipeline.
#[derive(Debug, Error)]
pub enum InferenceError {
	#[error("could not read scores from model output: {0}")]
	Output(String),
	#[error("model produced {got} scores but {expected} classes are known")]
	ClassCountMismatch { got: usize, expected: usize },
}
