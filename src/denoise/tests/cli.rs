
use assert_cmd::Command;
use predicates::str::contains;


const BIN_NAME: &str = "denoise";


fn cmd() -> Command {
	Command::cargo_bin(BIN_NAME)
		.unwrap()
}


#[test]
fn help() {
	cmd()
		.arg("--help")
		.assert()
		.success()
		.stderr(contains("--input"))
		.stderr(contains("--output"));
}


#[test]
fn missing_required() {
	cmd()
		.args(["--input", "tomos"])
		.assert()
		.failure();
}


#[test]
fn inner_failure_is_surfaced() {
	let dir = std::env::temp_dir();
	cmd()
		.current_dir(&dir)
		.args(["--input", "definitely-not-a-tomogram.mrc", "--output", "scaled.mrc"])
		.assert()
		.failure();
}
