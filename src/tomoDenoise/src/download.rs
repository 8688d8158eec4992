
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;


/// The pretrained CryoSiam denoising checkpoint.
pub const CANONICAL_MODEL_URL: &str = "https://www.dropbox.com/scl/fi/sxobvwa7k2ju54aimexhr/denoising_model.ckpt?rlkey=u2m4lv07rmfxmwcv6rf9uqaot&st=i12gjlxd&dl=1";


/// Fetches the file at `url` into `dest`, replacing anything already there.
/// There's no cache and no timeout: a stalled transfer blocks until the server gives up.
pub fn download(url: &str, dest: &Path) -> Result<u64> {

	// find the URL scheme, if any
	let scheme = url.split_once(':')
		.map(|(scheme, _)| scheme)
		.context(format!("Invalid URL: {}", url))?;
	match scheme {
		"http" | "https" => (),
		other => bail!("Unrecognized URL scheme: {}", other)
	}

	info!("Downloading {} -> {}", url, dest.to_string_lossy());

	let client = reqwest::blocking::Client::builder()
		.timeout(None)
		.build()
		.context("Failed to build HTTP client")?;
	let mut response = client.get(url)
		.send()
		.context(format!("Failed to request: {}", url))?
		.error_for_status()
		.context(format!("Download failed: {}", url))?;

	let file = File::create(dest)
		.context(format!("Failed to open file for writing: {}", dest.to_string_lossy()))?;
	let mut writer = BufWriter::new(file);
	let size = response.copy_to(&mut writer)
		.context(format!("Failed to download: {}", url))?;
	writer.flush()
		.context(format!("Failed to write file: {}", dest.to_string_lossy()))?;

	info!("Downloaded {} bytes", size);

	Ok(size)
}
