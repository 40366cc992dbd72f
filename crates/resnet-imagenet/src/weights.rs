use std::fs::{create_dir_all, File};
use std::io::{self, Write};
use std::path::PathBuf;

use burn::data::network::downloader;

/// Published torchvision checkpoints importable by
/// [`ResNet18::from_torch_file`](crate::model::ResNet18::from_torch_file).
pub enum PretrainedWeights {
	/// Original ImageNet-1k training run.
	/// Top-1 accuracy: 69.758%. Top-5 accuracy: 89.078%.
	ImageNet1kV1,
}

impl PretrainedWeights {
	pub fn url(&self) -> &'static str {
		match self {
			PretrainedWeights::ImageNet1kV1 => {
				"https://download.pytorch.org/models/resnet18-f37072fd.pth"
			}
		}
	}

	/// Fetch the checkpoint into the local cache and return its path. The
	/// download happens once; later calls reuse the cached file.
	pub fn fetch(&self) -> io::Result<PathBuf> {
		let model_dir = dirs::home_dir()
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found"))?
			.join(".cache")
			.join("resnet-imagenet");

		if !model_dir.exists() {
			create_dir_all(&model_dir)?;
		}

		let file_base_name = self
			.url()
			.rsplit_once('/')
			.map(|(_, name)| name)
			.unwrap_or("resnet18.pth");
		let file_name = model_dir.join(file_base_name);

		if !file_name.exists() {
			log::info!("downloading pretrained weights from {}", self.url());
			let bytes = downloader::download_file_as_bytes(self.url(), file_base_name);

			let mut output_file = File::create(&file_name)?;
			output_file.write_all(&bytes)?;
		}

		Ok(file_name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn checkpoint_url_points_at_a_pth_file() {
		let url = PretrainedWeights::ImageNet1kV1.url();

		assert!(url.starts_with("https://"));
		assert!(url.ends_with(".pth"));
	}
}
