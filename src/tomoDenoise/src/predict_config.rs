
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_yaml::{Mapping, Value};
use tracing::info;


pub const KEY_DATA_FOLDER: &str = "data_folder";
pub const KEY_LOG_FOLDER: &str = "log_folder";
pub const KEY_PREDICTION_FOLDER: &str = "prediction_folder";
pub const KEY_TRAINED_MODEL: &str = "trained_model";
pub const KEY_TEST_FILES: &str = "test_files";
pub const KEY_HYPER_PARAMETERS: &str = "hyper_parameters";
pub const KEY_BATCH_SIZE: &str = "batch_size";

pub const BATCH_SIZE: u64 = 20;


/// Where the predictor should read from and write to.
#[derive(Debug, Clone)]
pub struct PredictionPaths<'a> {
	pub data_folder: &'a Path,
	pub denoised_folder: &'a Path,
	pub trained_model: &'a Path
}


/// The predictor's YAML config.
/// Only a few keys are ever touched, everything else passes through as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictConfig {
	doc: Mapping
}

impl PredictConfig {

	pub fn parse(yaml: impl AsRef<str>) -> Result<Self> {
		let doc = serde_yaml::from_str::<Value>(yaml.as_ref())
			.context("Failed to parse YAML")?;
		let Value::Mapping(doc) = doc
			else { bail!("Config document is not a mapping"); };
		Ok(Self {
			doc
		})
	}

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let yaml = fs::read_to_string(path)
			.context(format!("Failed to read config file: {}", path.to_string_lossy()))?;
		Self::parse(yaml)
			.context(format!("Failed to parse config file: {}", path.to_string_lossy()))
	}

	pub fn to_yaml(&self) -> Result<String> {
		serde_yaml::to_string(&self.doc)
			.context("Failed to serialize config")
	}

	pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		fs::write(path, self.to_yaml()?)
			.context(format!("Failed to write config file: {}", path.to_string_lossy()))?;
		info!("Wrote predictor config: {}", path.to_string_lossy());
		Ok(())
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.doc.get(key)
	}

	/// Points the predictor at our folders and model, and asks it to process every file in the data folder.
	pub fn apply(&mut self, paths: &PredictionPaths<'_>) -> Result<()> {

		// batch size goes first: a config without hyper parameters is broken, so leave it untouched
		self.doc.get_mut(KEY_HYPER_PARAMETERS)
			.context(format!("Config has no {} section", KEY_HYPER_PARAMETERS))?
			.as_mapping_mut()
			.context(format!("Config {} is not a mapping", KEY_HYPER_PARAMETERS))?
			.insert(KEY_BATCH_SIZE.into(), BATCH_SIZE.into());

		self.set_path(KEY_DATA_FOLDER, paths.data_folder);
		self.set_path(KEY_LOG_FOLDER, paths.denoised_folder);
		self.set_path(KEY_PREDICTION_FOLDER, paths.denoised_folder);
		self.set_path(KEY_TRAINED_MODEL, paths.trained_model);

		// null test files means all the files
		self.doc.insert(KEY_TEST_FILES.into(), Value::Null);

		Ok(())
	}

	fn set_path(&mut self, key: &str, path: &Path) {
		self.doc.insert(key.into(), path.to_string_lossy().to_string().into());
	}
}
