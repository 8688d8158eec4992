
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;


/// Something that can denoise the tomograms described by a predictor config file.
pub trait Predictor {
	fn run_prediction(&self, config_path: &Path) -> Result<()>;
}


/// Python snippet that hands the config path to the CryoSiam denoising entry point.
const CRYOSIAM_PREDICT: &str = "import sys; from cryosiam.apps.dense_simsiam_regression.predict import main; main(sys.argv[1])";

/// Where the predictor config template lives, inside a CryoSiam checkout.
pub const CRYOSIAM_CONFIG_DIR: &str = "cryosiam/apps/dense_simsiam_regression";


/// Runs the predictor as a child process, with the config path as the last argument.
/// The working folder and module search path apply to the child only.
#[derive(Debug, Clone)]
pub struct ProcessPredictor {
	program: OsString,
	args: Vec<OsString>,
	cwd: Option<PathBuf>,
	python_path: Option<PathBuf>
}

impl ProcessPredictor {

	/// An executable that takes the config path as its only argument.
	pub fn new(program: impl Into<OsString>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			cwd: None,
			python_path: None
		}
	}

	/// Calls into the prediction module of a CryoSiam checkout using `python`.
	pub fn cryosiam(repo_dir: impl Into<PathBuf>) -> Self {
		let repo_dir = repo_dir.into();
		Self::new("python")
			.arg("-c")
			.arg(CRYOSIAM_PREDICT)
			.python_path(repo_dir)
	}

	pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
		self.cwd = Some(dir.into());
		self
	}

	pub fn python_path(mut self, dir: impl Into<PathBuf>) -> Self {
		self.python_path = Some(dir.into());
		self
	}

	fn command(&self, config_path: &Path) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.args)
			.arg(config_path);
		if let Some(cwd) = &self.cwd {
			cmd.current_dir(cwd);
		}
		if let Some(python_path) = &self.python_path {
			cmd.env("PYTHONPATH", python_path);
		}
		cmd
	}
}

impl Predictor for ProcessPredictor {

	fn run_prediction(&self, config_path: &Path) -> Result<()> {
		let cmd = self.command(config_path);
		info!("Running predictor: {:?}", cmd);
		run_command(cmd)
	}
}


/// Runs the command to completion, failing on a non-zero exit.
pub fn run_command(mut cmd: Command) -> Result<()> {

	let program = cmd.get_program()
		.to_string_lossy()
		.to_string();

	let exit = cmd.status()
		.context(format!("Failed to run command: {}", program))?;

	if exit.success() {
		Ok(())
	} else if let Some(code) = exit.code() {
		bail!("{} exited with code: {}", program, code);
	} else {
		bail!("{} was killed", program);
	}
}
