
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::mrc::Mrc;
use crate::normalize::{self, Percentiles};


/// File extensions recognized as tomograms in directory mode.
pub const TOMOGRAM_EXTENSIONS: [&str; 2] = [".mrc", ".rec"];


pub fn is_tomogram(name: impl AsRef<str>) -> bool {
	let name = name.as_ref();
	TOMOGRAM_EXTENSIONS.iter()
		.any(|ext| name.ends_with(ext))
}


/// Normalizes one tomogram file, or every tomogram in a folder.
///
/// For a folder, each tomogram is written under `out_path` with the same file name.
/// For a file, the result is written to `out_path` itself.
/// Returns the paths that were written.
pub fn normalize_path(in_path: &Path, out_path: &Path, percentiles: Percentiles) -> Result<Vec<PathBuf>> {

	let is_dir = in_path.is_dir();
	if is_dir {
		normalize_dir(in_path, out_path, percentiles)
	} else {
		if let Some(parent) = out_path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)
					.context(format!("Failed to create output folder: {}", parent.to_string_lossy()))?;
			}
		}
		normalize_file(in_path, out_path, percentiles)?;
		Ok(vec![out_path.to_path_buf()])
	}
}


fn normalize_dir(in_dir: &Path, out_dir: &Path, percentiles: Percentiles) -> Result<Vec<PathBuf>> {

	fs::create_dir_all(out_dir)
		.context(format!("Failed to create output folder: {}", out_dir.to_string_lossy()))?;

	// sort by name, so runs are repeatable
	let mut names = Vec::<String>::new();
	let entries = fs::read_dir(in_dir)
		.context(format!("Failed to list folder: {}", in_dir.to_string_lossy()))?;
	for entry in entries {
		let entry = entry
			.context(format!("Failed to read folder entry in: {}", in_dir.to_string_lossy()))?;
		let name = entry.file_name()
			.to_string_lossy()
			.to_string();
		if is_tomogram(&name) {
			names.push(name);
		} else {
			debug!("Skipping non-tomogram: {}", name);
		}
	}
	names.sort();

	info!("Found {} tomogram(s) in: {}", names.len(), in_dir.to_string_lossy());

	let mut written = Vec::with_capacity(names.len());
	for name in names {
		let out_path = out_dir.join(&name);
		normalize_file(&in_dir.join(&name), &out_path, percentiles)?;
		written.push(out_path);
	}

	Ok(written)
}


/// Reads, inverts, scales, and writes one tomogram, keeping its voxel size.
pub fn normalize_file(in_path: &Path, out_path: &Path, percentiles: Percentiles) -> Result<()> {

	let tomogram = Mrc::read(in_path)?;
	let voxels = normalize::normalize(tomogram.voxels(), percentiles)
		.context(format!("Failed to normalize tomogram: {}", in_path.to_string_lossy()))?;
	let tomogram = tomogram.with_voxels(voxels)?;
	tomogram.save(out_path)?;

	info!("Normalized {} -> {}", in_path.to_string_lossy(), out_path.to_string_lossy());

	Ok(())
}
