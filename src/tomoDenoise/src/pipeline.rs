
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::batch;
use crate::download;
use crate::image;
use crate::normalize::Percentiles;
use crate::predict::Predictor;
use crate::predict_config::{PredictConfig, PredictionPaths};


/// Everything needed for one denoising run.
#[derive(Debug, Clone)]
pub struct Pipeline {
	pub input_path: PathBuf,
	pub out_path: PathBuf,
	pub denoised_path: PathBuf,
	pub percentiles: Percentiles,
	pub model_url: String,
	pub model_path: PathBuf,
	pub config_template: PathBuf,
	pub config_out: PathBuf,
	pub preview: Option<Preview>
}


/// Which tomogram slice to render after denoising.
#[derive(Debug, Clone)]
pub struct Preview {
	pub tomo_name: String,
	pub z: usize,
	pub figures_dir: PathBuf
}


impl Pipeline {

	#[tracing::instrument(skip_all, level = 5, name = "Pipeline")]
	pub fn run(&self, predictor: &dyn Predictor) -> Result<()> {

		// invert and scale the tomograms
		let written = batch::normalize_path(&self.input_path, &self.out_path, self.percentiles)?;
		info!("Normalized {} tomogram(s)", written.len());

		let data_folder = self.data_folder();

		// get the model checkpoint, fresh every time
		download::download(&self.model_url, &self.model_path)?;

		// point the predictor at our files
		let mut config = PredictConfig::read(&self.config_template)?;
		config.apply(&PredictionPaths {
			data_folder: &data_folder,
			denoised_folder: &self.denoised_path,
			trained_model: &self.model_path
		})?;
		config.write(&self.config_out)?;

		fs::create_dir_all(&self.denoised_path)
			.context(format!("Failed to create denoised folder: {}", self.denoised_path.to_string_lossy()))?;

		predictor.run_prediction(&self.config_out)
			.context("Prediction failed")?;
		info!("Prediction finished, denoised tomograms are in: {}", self.denoised_path.to_string_lossy());

		if let Some(preview) = &self.preview {
			image::render_comparison(
				&data_folder.join(&preview.tomo_name),
				&self.denoised_path.join(&preview.tomo_name),
				preview.z,
				&preview.figures_dir
			)?;
		}

		Ok(())
	}

	/// The folder holding the normalized tomograms.
	/// For a single input file, that's the folder the output file was written into.
	pub fn data_folder(&self) -> PathBuf {
		if self.input_path.is_dir() {
			self.out_path.clone()
		} else {
			match self.out_path.parent() {
				Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
				_ => Path::new(".").to_path_buf()
			}
		}
	}
}
