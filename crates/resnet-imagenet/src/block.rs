use std::f64::consts::SQRT_2;

use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Initializer, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Device, Module, Tensor};

// ReLU-recommended gain, applied fan-out like torchvision.
pub(crate) fn conv_initializer() -> Initializer {
	Initializer::KaimingNormal {
		gain: SQRT_2,
		fan_out_only: true,
	}
}

/// Basic residual block of ResNet-18: two 3x3 convolutions plus the skip
/// connection. Field names line up with the remapped torchvision state dict
/// keys, so renaming them breaks weight import.
#[derive(Debug, Module)]
pub struct BasicBlock<B: Backend> {
	pub(crate) conv1: Conv2d<B>,
	pub(crate) bn1: BatchNorm<B, 2>,
	pub(crate) conv2: Conv2d<B>,
	pub(crate) bn2: BatchNorm<B, 2>,
	pub(crate) relu: Relu,
	pub(crate) downsample: Option<Downsample<B>>,
}

impl<B: Backend> BasicBlock<B> {
	pub fn init(in_channels: usize, out_channels: usize, stride: usize, device: &Device<B>) -> Self {
		let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
			.with_stride([stride, stride])
			.with_padding(PaddingConfig2d::Explicit(1, 1))
			.with_bias(false)
			.with_initializer(conv_initializer())
			.init(device);
		let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
			.with_stride([1, 1])
			.with_padding(PaddingConfig2d::Explicit(1, 1))
			.with_bias(false)
			.with_initializer(conv_initializer())
			.init(device);

		let downsample = (in_channels != out_channels)
			.then(|| Downsample::init(in_channels, out_channels, stride, device));

		Self {
			conv1,
			bn1: BatchNormConfig::new(out_channels).init(device),
			conv2,
			bn2: BatchNormConfig::new(out_channels).init(device),
			relu: Relu::new(),
			downsample,
		}
	}

	pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
		let identity = input.clone();

		let x = self.conv1.forward(input);
		let x = self.bn1.forward(x);
		let x = self.relu.forward(x);

		let x = self.conv2.forward(x);
		let x = self.bn2.forward(x);

		// skip
		let x = match &self.downsample {
			Some(downsample) => x + downsample.forward(&identity),
			None => x + identity,
		};

		self.relu.forward(x)
	}
}

/// 1x1 projection applied to the identity path when the channel count or
/// stride changes between layers.
#[derive(Debug, Module)]
pub struct Downsample<B: Backend> {
	pub(crate) conv: Conv2d<B>,
	pub(crate) bn: BatchNorm<B, 2>,
}

impl<B: Backend> Downsample<B> {
	pub fn init(in_channels: usize, out_channels: usize, stride: usize, device: &Device<B>) -> Self {
		let conv = Conv2dConfig::new([in_channels, out_channels], [1, 1])
			.with_stride([stride, stride])
			.with_padding(PaddingConfig2d::Explicit(0, 0))
			.with_bias(false)
			.with_initializer(conv_initializer())
			.init(device);

		Self {
			conv,
			bn: BatchNormConfig::new(out_channels).init(device),
		}
	}

	pub fn forward(&self, input: &Tensor<B, 4>) -> Tensor<B, 4> {
		let x = self.conv.forward(input.clone());
		self.bn.forward(x)
	}
}

/// One of the four residual stages. Only the first block may change channel
/// count or stride; the rest keep the shape.
#[derive(Debug, Module)]
pub struct LayerBlock<B: Backend> {
	pub(crate) blocks: Vec<BasicBlock<B>>,
}

impl<B: Backend> LayerBlock<B> {
	pub fn init(
		num_blocks: usize,
		in_channels: usize,
		out_channels: usize,
		stride: usize,
		device: &Device<B>,
	) -> Self {
		let blocks = (0..num_blocks)
			.map(|b| {
				if b == 0 {
					BasicBlock::init(in_channels, out_channels, stride, device)
				} else {
					BasicBlock::init(out_channels, out_channels, 1, device)
				}
			})
			.collect();

		Self { blocks }
	}

	pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
		let mut x = input;
		for block in &self.blocks {
			x = block.forward(x);
		}
		x
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use burn::backend::NdArray;

	type TestBackend = NdArray<f32>;

	#[test]
	fn basic_block_keeps_shape_at_stride_one() {
		let device = Default::default();
		let block = BasicBlock::<TestBackend>::init(8, 8, 1, &device);

		let out = block.forward(Tensor::zeros([1, 8, 16, 16], &device));

		assert_eq!(out.dims(), [1, 8, 16, 16]);
	}

	#[test]
	fn first_block_of_a_layer_downsamples() {
		let device = Default::default();
		let layer = LayerBlock::<TestBackend>::init(2, 8, 16, 2, &device);

		let out = layer.forward(Tensor::zeros([1, 8, 16, 16], &device));

		assert_eq!(out.dims(), [1, 16, 8, 8]);
	}

	#[test]
	fn channel_change_gets_a_projection() {
		let device = Default::default();

		let same = BasicBlock::<TestBackend>::init(8, 8, 1, &device);
		let wider = BasicBlock::<TestBackend>::init(8, 16, 2, &device);

		assert!(same.downsample.is_none());
		assert!(wider.downsample.is_some());
	}
}
