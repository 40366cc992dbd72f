use std::path::Path;

use burn::prelude::{Backend, Device, Tensor};
use burn::tensor::activation::softmax;
use burn::tensor::TensorData;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{InferenceError, LoadError};
use crate::imagenet::{self, Normalizer, Prediction};
use crate::model::ResNet18;
use crate::weights::PretrainedWeights;

/// Side length every upload is resized to before inference.
pub const INPUT_SIDE: u32 = 600;

/// How many ranked predictions `classify` returns.
pub const TOP_K: usize = 5;

/// A ready-to-use pretrained classifier: network, preprocessing and label
/// decoding behind one handle.
///
/// Construction is expensive (weight download and import), so build one at
/// startup and share it. All methods borrow `self` immutably; the parameter
/// tensors never change after construction, so a shared instance serves
/// concurrent callers without locking.
pub struct ImageClassifier<B: Backend> {
	model: ResNet18<B>,
	normalizer: Normalizer<B>,
	device: Device<B>,
	input_side: u32,
}

impl<B: Backend> ImageClassifier<B> {
	/// Fetch (or reuse) the pretrained ImageNet-1k checkpoint and build a
	/// ready classifier.
	pub fn pretrained(device: &Device<B>) -> Result<Self, LoadError> {
		let checkpoint = PretrainedWeights::ImageNet1kV1.fetch()?;
		Self::from_weights_file(checkpoint, device)
	}

	/// Build the classifier from an already-downloaded torch checkpoint.
	pub fn from_weights_file<P: AsRef<Path>>(path: P, device: &Device<B>) -> Result<Self, LoadError> {
		let model = ResNet18::from_torch_file(path, device)?;
		Ok(Self::from_model(model, device.clone()))
	}

	/// Wrap an existing network. Lets tests run the full pipeline with a
	/// randomly initialized model.
	pub fn from_model(model: ResNet18<B>, device: Device<B>) -> Self {
		Self {
			model,
			normalizer: Normalizer::new(&device),
			device,
			input_side: INPUT_SIDE,
		}
	}

	pub fn with_input_side(mut self, side: u32) -> Self {
		self.input_side = side;
		self
	}

	/// RGB, resize to the expected side, scale to [0, 1], channel-normalize,
	/// batch of one.
	pub fn preprocess(&self, image: &DynamicImage) -> Tensor<B, 4> {
		let side = self.input_side;
		let rgb = image
			.resize_exact(side, side, FilterType::Lanczos3)
			.into_rgb8();

		let data = TensorData::new(rgb.into_raw(), [side as usize, side as usize, 3])
			.convert::<B::FloatElem>();
		let pixels = Tensor::<B, 3>::from_data(data, &self.device).permute([2, 0, 1]) / 255;

		self.normalizer.normalize(pixels.unsqueeze::<4>())
	}

	/// Forward pass plus softmax, decoded into ranked label/probability
	/// pairs, best first.
	pub fn infer(&self, input: Tensor<B, 4>) -> Result<Vec<Prediction>, InferenceError> {
		let logits = self.model.forward(input);
		let scores = softmax(logits, 1)
			.into_data()
			.convert::<f32>()
			.to_vec::<f32>()
			.map_err(|err| InferenceError::Output(format!("{err:?}")))?;

		imagenet::decode_top_k(&scores, TOP_K)
	}

	/// The whole per-image pipeline: preprocess, infer, decode.
	pub fn classify(&self, image: &DynamicImage) -> Result<Vec<Prediction>, InferenceError> {
		self.infer(self.preprocess(image))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use burn::backend::NdArray;
	use image::RgbImage;

	type TestBackend = NdArray<f32>;

	fn small_classifier() -> ImageClassifier<TestBackend> {
		let device = Default::default();
		ImageClassifier::from_model(ResNet18::init(imagenet::CLASS_COUNT, &device), device)
			.with_input_side(64)
	}

	fn gradient_image(width: u32, height: u32) -> DynamicImage {
		DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
			image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
		}))
	}

	#[test]
	fn preprocess_yields_single_batch_nchw() {
		let classifier = small_classifier();

		let tensor = classifier.preprocess(&gradient_image(100, 40));

		assert_eq!(tensor.dims(), [1, 3, 64, 64]);
	}

	#[test]
	fn classify_returns_ranked_probabilities() {
		let classifier = small_classifier();

		let predictions = classifier.classify(&gradient_image(64, 64)).unwrap();

		assert_eq!(predictions.len(), TOP_K);
		for pair in predictions.windows(2) {
			assert!(pair[0].score >= pair[1].score);
		}
		for prediction in &predictions {
			assert!(!prediction.label.is_empty());
			assert!((0.0..=1.0).contains(&prediction.score));
		}
	}

	#[test]
	fn classify_is_deterministic() {
		let classifier = small_classifier();
		let image = gradient_image(64, 64);

		let first = classifier.classify(&image).unwrap();
		let second = classifier.classify(&image).unwrap();

		assert_eq!(first, second);
	}
}
