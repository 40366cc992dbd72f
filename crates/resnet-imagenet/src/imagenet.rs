use std::sync::LazyLock;

use burn::prelude::{Backend, Device, Tensor};

use crate::error::InferenceError;

pub const CLASS_COUNT: usize = 1000;

// ImageNet-1k class tokens in torchvision index order, one per line.
static LABELS_RAW: &str = include_str!("imagenet_labels.txt");

pub static CLASSES: LazyLock<Vec<&'static str>> = LazyLock::new(|| LABELS_RAW.lines().collect());

/// Channel statistics of the ImageNet training set, applied after scaling
/// pixels to [0, 1].
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Per-channel centering/scaling over NCHW batches.
pub struct Normalizer<B: Backend> {
	mean: Tensor<B, 4>,
	std: Tensor<B, 4>,
}

impl<B: Backend> Normalizer<B> {
	pub fn new(device: &Device<B>) -> Self {
		let mean = Tensor::<B, 1>::from_floats(MEAN, device).reshape([1, 3, 1, 1]);
		let std = Tensor::<B, 1>::from_floats(STD, device).reshape([1, 3, 1, 1]);

		Self { mean, std }
	}

	/// Input must already hold values in [0, 1].
	pub fn normalize(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
		(input - self.mean.clone()) / self.std.clone()
	}
}

/// One ranked classification result.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
	pub label: String,
	pub score: f32,
}

/// Rank a full score vector and resolve the top `k` entries to class
/// tokens, best first.
pub fn decode_top_k(scores: &[f32], k: usize) -> Result<Vec<Prediction>, InferenceError> {
	if scores.len() != CLASSES.len() {
		return Err(InferenceError::ClassCountMismatch {
			got: scores.len(),
			expected: CLASSES.len(),
		});
	}

	let mut ranked: Vec<usize> = (0..scores.len()).collect();
	ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

	Ok(ranked
		.into_iter()
		.take(k)
		.map(|index| Prediction {
			label: CLASSES[index].to_string(),
			score: scores[index],
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use burn::backend::NdArray;

	type TestBackend = NdArray<f32>;

	#[test]
	fn label_table_is_complete() {
		assert_eq!(CLASSES.len(), CLASS_COUNT);
		assert!(CLASSES.iter().all(|label| !label.is_empty()));
	}

	#[test]
	fn label_table_anchors() {
		assert_eq!(CLASSES[0], "tench");
		assert_eq!(CLASSES[207], "golden_retriever");
		assert_eq!(CLASSES[340], "zebra");
		assert_eq!(CLASSES[999], "toilet_tissue");
	}

	#[test]
	fn decode_ranks_best_first() {
		let mut scores = vec![0.0; CLASS_COUNT];
		scores[207] = 0.7;
		scores[151] = 0.2;
		scores[0] = 0.1;

		let predictions = decode_top_k(&scores, 3).unwrap();

		assert_eq!(predictions[0].label, "golden_retriever");
		assert_eq!(predictions[0].score, 0.7);
		assert_eq!(predictions[1].label, "Chihuahua");
		assert_eq!(predictions[2].label, "tench");
	}

	#[test]
	fn decode_rejects_wrong_score_count() {
		let scores = vec![0.5; 10];

		assert!(matches!(
			decode_top_k(&scores, 1),
			Err(InferenceError::ClassCountMismatch { got: 10, .. })
		));
	}

	#[test]
	fn normalizer_centers_channels() {
		let device = Default::default();
		let normalizer = Normalizer::<TestBackend>::new(&device);

		let input = Tensor::ones([1, 3, 2, 2], &device) * 0.5;
		let values = normalizer
			.normalize(input)
			.into_data()
			.to_vec::<f32>()
			.unwrap();

		for channel in 0..3 {
			let expected = (0.5 - MEAN[channel]) / STD[channel];
			for &value in &values[channel * 4..(channel + 1) * 4] {
				assert!((value - expected).abs() < 1e-5);
			}
		}
	}
}
