
use std::path::Path;

use assert_fs::TempDir;
use galvanic_assert::{assert_that, matchers::*};
use indoc::indoc;
use serde_yaml::Value;

use tomo_denoise::logging;
use tomo_denoise::predict_config::{PredictConfig, PredictionPaths};


const TEMPLATE: &str = indoc! { r#"
	data_folder: /content/data
	log_folder: /content/logs
	prediction_folder: /content/predictions
	trained_model: /content/old.ckpt
	test_files:
	  - tomo_01.mrc
	  - tomo_02.mrc
	patch_size: [128, 128, 128]
	parameters:
	  network:
	    in_channels: 1
	hyper_parameters:
	  batch_size: 2
	  learning_rate: 0.001
"# };


fn paths() -> PredictionPaths<'static> {
	PredictionPaths {
		data_folder: Path::new("/data/scaled"),
		denoised_folder: Path::new("./denoised"),
		trained_model: Path::new("model.ckpt")
	}
}


#[test]
fn apply_overrides() {
	let _logging = logging::init_test();

	let mut config = PredictConfig::parse(TEMPLATE).unwrap();
	config.apply(&paths()).unwrap();

	let text = |key: &str| config.get(key).and_then(Value::as_str);
	assert_that!(&text("data_folder"), eq(Some("/data/scaled")));
	assert_that!(&text("log_folder"), eq(Some("./denoised")));
	assert_that!(&text("prediction_folder"), eq(Some("./denoised")));
	assert_that!(&text("trained_model"), eq(Some("model.ckpt")));
	assert_that!(&config.get("test_files").map(Value::is_null), eq(Some(true)));

	let hyper = config.get("hyper_parameters").unwrap();
	assert_that!(&hyper.get("batch_size").and_then(Value::as_u64), eq(Some(20)));
}


#[test]
fn apply_keeps_everything_else() {
	let _logging = logging::init_test();

	let original = PredictConfig::parse(TEMPLATE).unwrap();
	let mut config = original.clone();
	config.apply(&paths()).unwrap();

	assert_that!(&config.get("patch_size"), eq(original.get("patch_size")));
	assert_that!(&config.get("parameters"), eq(original.get("parameters")));
	let hyper = config.get("hyper_parameters").unwrap();
	assert_that!(&hyper.get("learning_rate").and_then(Value::as_f64), eq(Some(0.001)));
}


#[test]
fn missing_hyper_parameters() {
	let _logging = logging::init_test();

	let mut config = PredictConfig::parse("data_folder: /data\n").unwrap();
	assert_that!(&config.apply(&paths()).is_err(), eq(true));

	// nothing changed
	assert_that!(&config.get("data_folder").and_then(Value::as_str), eq(Some("/data")));
	assert_that!(&config.get("test_files").is_none(), eq(true));

	let mut config = PredictConfig::parse("hyper_parameters: 5\n").unwrap();
	assert_that!(&config.apply(&paths()).is_err(), eq(true));
}


#[test]
fn reject_non_mapping() {
	assert_that!(&PredictConfig::parse("- a\n- b\n").is_err(), eq(true));
	assert_that!(&PredictConfig::parse("a: [unclosed\n").is_err(), eq(true));
}


#[test]
fn write_then_read() {
	let _logging = logging::init_test();
	let dir = TempDir::new().unwrap();
	let template_path = dir.path().join("config_test.yaml");
	let out_path = dir.path().join("config.yaml");
	std::fs::write(&template_path, TEMPLATE).unwrap();

	let mut config = PredictConfig::read(&template_path).unwrap();
	config.apply(&paths()).unwrap();
	config.write(&out_path).unwrap();

	let reread = PredictConfig::read(&out_path).unwrap();
	assert_that!(&reread, eq(config));
}


#[test]
fn read_missing() {
	let dir = TempDir::new().unwrap();
	assert_that!(&PredictConfig::read(dir.path().join("nope.yaml")).is_err(), eq(true));
}
