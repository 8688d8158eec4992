
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{Context, Result};
use gumdrop::Options;
use tracing::info;

use tomo_denoise::logging::{self, ResultExt};
use tomo_denoise::predict::run_command;


const INNER_BIN: &str = "tomo-denoise";
const DENOISED_DIR: &str = "./denoised";
const Z_AXIS: u32 = 50;


#[derive(Options)]
struct Args {

	/// Prints this help message
	#[options(help_flag)]
	help: bool,

	/// settings for log output
	#[options(default = "denoise=info")]
	log: String,

	/// Input path for tomograms
	#[options(required, parse(try_from_str), meta = "PATH")]
	input: PathBuf,

	/// Output path for inverted/scaled tomograms
	#[options(required, parse(try_from_str), meta = "PATH")]
	output: PathBuf
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

	ExitCode::SUCCESS
}


fn run(args: Args) -> Result<()> {
	let cmd = inner_command(&inner_bin()?, &args);
	info!("Running: {:?}", cmd);
	run_command(cmd)
}


/// The inner tool's invocation: the user's two paths plus the fixed denoising settings.
fn inner_command(bin: &Path, args: &Args) -> Command {
	let mut cmd = Command::new(bin);
	cmd.arg("--input_path").arg(&args.input)
		.arg("--out_path").arg(&args.output)
		.arg("--output_denoised_path").arg(DENOISED_DIR)
		.arg("--z_axis").arg(Z_AXIS.to_string());
	cmd
}


/// Prefers the inner tool installed next to this one, then falls back to PATH.
fn inner_bin() -> Result<PathBuf> {
	let exe = env::current_exe()
		.context("Failed to find own executable")?;
	let sibling = exe.with_file_name(format!("{}{}", INNER_BIN, env::consts::EXE_SUFFIX));
	if sibling.exists() {
		Ok(sibling)
	} else {
		Ok(PathBuf::from(INNER_BIN))
	}
}
