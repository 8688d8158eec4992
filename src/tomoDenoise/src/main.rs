
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use gumdrop::Options;
use tracing::info;

use tomo_denoise::download::CANONICAL_MODEL_URL;
use tomo_denoise::logging::{self, ResultExt};
use tomo_denoise::normalize::Percentiles;
use tomo_denoise::pipeline::{Pipeline, Preview};
use tomo_denoise::predict::{ProcessPredictor, CRYOSIAM_CONFIG_DIR};


#[derive(Options)]
struct Args {

	/// Prints this help message
	#[options(help_flag)]
	help: bool,

	/// settings for log output
	#[options(default = "tomo_denoise=info")]
	log: String,

	/// Tomogram file, or folder of .mrc/.rec tomograms
	#[options(no_short, long = "input_path", required, parse(try_from_str), meta = "PATH")]
	input_path: PathBuf,

	/// Where to write the inverted and scaled tomogram(s)
	#[options(no_short, long = "out_path", required, parse(try_from_str), meta = "PATH")]
	out_path: PathBuf,

	/// Where the predictor writes the denoised tomogram(s)
	#[options(no_short, long = "output_denoised_path", required, parse(try_from_str), meta = "PATH")]
	output_denoised_path: PathBuf,

	/// Tomogram file name to render after denoising
	#[options(no_short, long = "tomo_name", meta = "NAME")]
	tomo_name: Option<String>,

	/// Z slice to render
	#[options(no_short, long = "z_axis", default = "50", meta = "Z")]
	z_axis: usize,

	/// CryoSiam checkout, holding the predictor code and config template
	#[options(no_short, long = "cryosiam_dir", default = "./cryosiam_beta", parse(try_from_str), meta = "PATH")]
	cryosiam_dir: PathBuf,

	/// Predictor config template, defaults to the one in the CryoSiam checkout
	#[options(no_short, long = "config_template", parse(try_from_str), meta = "PATH")]
	config_template: Option<PathBuf>,

	/// Where to write the predictor config, defaults to next to the template
	#[options(no_short, long = "config_out", parse(try_from_str), meta = "PATH")]
	config_out: Option<PathBuf>,

	/// Where to download the model checkpoint from
	#[options(no_short, long = "model_url", meta = "URL")]
	model_url: Option<String>,

	/// Local path for the model checkpoint
	#[options(no_short, long = "model_path", default = "model.ckpt", parse(try_from_str), meta = "PATH")]
	model_path: PathBuf,

	/// Predictor executable taking the config path as its only argument, instead of CryoSiam
	#[options(no_short, long = "predictor", parse(try_from_str), meta = "PATH")]
	predictor: Option<PathBuf>,

	/// Where to save the slice images
	#[options(no_short, long = "figures_dir", default = ".", parse(try_from_str), meta = "PATH")]
	figures_dir: PathBuf
}


fn main() -> ExitCode {

	// parse arguments
	let args = Args::parse_args_default_or_exit();

	// init logging
	let Ok(_) = logging::init(&args.log)
		.log_err()
		else { return ExitCode::FAILURE; };

	let Ok(_) = run(args)
		.log_err()
		else { return ExitCode::FAILURE; };

	// we finished! =)
	ExitCode::SUCCESS
}


#[tracing::instrument(skip_all, level = 5, name = "TomoDenoise")]
fn run(args: Args) -> Result<()> {

	let config_dir = args.cryosiam_dir.join(CRYOSIAM_CONFIG_DIR);
	let config_template = args.config_template
		.unwrap_or_else(|| config_dir.join("config_test.yaml"));
	let config_out = match args.config_out {
		Some(path) => path,
		None => match config_template.parent() {
			Some(dir) => dir.join("config.yaml"),
			None => PathBuf::from("config.yaml")
		}
	};

	let predictor = match args.predictor {
		Some(exe) => ProcessPredictor::new(exe),
		None => ProcessPredictor::cryosiam(&args.cryosiam_dir)
	};

	let pipeline = Pipeline {
		input_path: args.input_path,
		out_path: args.out_path,
		denoised_path: args.output_denoised_path,
		percentiles: Percentiles::default(),
		model_url: args.model_url
			.unwrap_or_else(|| CANONICAL_MODEL_URL.to_string()),
		model_path: args.model_path,
		config_template,
		config_out,
		preview: args.tomo_name.map(|tomo_name| Preview {
			tomo_name,
			z: args.z_axis,
			figures_dir: args.figures_dir
		})
	};
	info!("Input: {}", pipeline.input_path.to_string_lossy());

	pipeline.run(&predictor)
}
