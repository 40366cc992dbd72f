use std::path::Path;

use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Device, Module, Tensor};
use burn::record::{FullPrecisionSettings, Recorder, RecorderError};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};

use crate::block::{conv_initializer, LayerBlock};
use crate::imagenet::CLASS_COUNT;

const LAYER_BLOCKS: [usize; 4] = [2, 2, 2, 2];

/// ResNet-18 with basic residual blocks only. The adaptive average pool in
/// front of the classifier head accepts any input side from 32 upwards, so
/// the network runs unchanged on the service's 600x600 uploads.
#[derive(Debug, Module)]
pub struct ResNet18<B: Backend> {
	pub(crate) conv1: Conv2d<B>,
	pub(crate) bn1: BatchNorm<B, 2>,
	pub(crate) relu: Relu,
	pub(crate) maxpool: MaxPool2d,
	pub(crate) layer1: LayerBlock<B>,
	pub(crate) layer2: LayerBlock<B>,
	pub(crate) layer3: LayerBlock<B>,
	pub(crate) layer4: LayerBlock<B>,
	pub(crate) avgpool: AdaptiveAvgPool2d,
	pub(crate) fc: Linear<B>,
}

impl<B: Backend> ResNet18<B> {
	/// Randomly initialized network (Kaiming-normal convolutions).
	pub fn init(num_classes: usize, device: &Device<B>) -> Self {
		// 7x7 conv, 64, /2
		let conv1 = Conv2dConfig::new([3, 64], [7, 7])
			.with_stride([2, 2])
			.with_padding(PaddingConfig2d::Explicit(3, 3))
			.with_bias(false)
			.with_initializer(conv_initializer())
			.init(device);

		// 3x3 maxpool, /2
		let maxpool = MaxPool2dConfig::new([3, 3])
			.with_strides([2, 2])
			.with_padding(PaddingConfig2d::Explicit(1, 1))
			.init();

		let layer1 = LayerBlock::init(LAYER_BLOCKS[0], 64, 64, 1, device);
		let layer2 = LayerBlock::init(LAYER_BLOCKS[1], 64, 128, 2, device);
		let layer3 = LayerBlock::init(LAYER_BLOCKS[2], 128, 256, 2, device);
		let layer4 = LayerBlock::init(LAYER_BLOCKS[3], 256, 512, 2, device);

		Self {
			conv1,
			bn1: BatchNormConfig::new(64).init(device),
			relu: Relu::new(),
			maxpool,
			layer1,
			layer2,
			layer3,
			layer4,
			// [B, 512, H, W] -> [B, 512, 1, 1]
			avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
			fc: LinearConfig::new(512, num_classes).init(device),
		}
	}

	/// Import a torchvision ResNet-18 state dict (e.g. the published
	/// ImageNet-1k checkpoint) into a ready network.
	pub fn from_torch_file<P: AsRef<Path>>(path: P, device: &Device<B>) -> Result<Self, RecorderError> {
		let load_args = LoadArgs::new(path.as_ref().to_path_buf())
			// Map *.downsample.0.* -> *.downsample.conv.*
			.with_key_remap("(.+)\\.downsample\\.0\\.(.+)", "$1.downsample.conv.$2")
			// Map *.downsample.1.* -> *.downsample.bn.*
			.with_key_remap("(.+)\\.downsample\\.1\\.(.+)", "$1.downsample.bn.$2")
			// Map layer[i].[j].* -> layer[i].blocks.[j].*
			.with_key_remap("(layer[1-4])\\.([0-9]+)\\.(.+)", "$1.blocks.$2.$3");

		let record: ResNet18Record<B> =
			PyTorchFileRecorder::<FullPrecisionSettings>::new().load(load_args, device)?;

		Ok(Self::init(CLASS_COUNT, device).load_record(record))
	}

	/// Raw class logits, shape [batch, num_classes].
	pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
		let x = self.conv1.forward(input);
		let x = self.bn1.forward(x);
		let x = self.relu.forward(x);
		let x = self.maxpool.forward(x);

		let x = self.layer1.forward(x);
		let x = self.layer2.forward(x);
		let x = self.layer3.forward(x);
		let x = self.layer4.forward(x);

		let x = self.avgpool.forward(x);
		let x = x.flatten(1, 3);

		self.fc.forward(x)
	}
}
