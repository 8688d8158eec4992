
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use tracing::info;

use crate::mrc::Mrc;


/// One Z section of a volume, rendered in grayscale.
pub struct SliceImage {
	img: GrayImage
}

impl SliceImage {

	/// Renders slice `z` with the sign flipped back, so the display matches the raw tomogram's contrast.
	/// The slice's own min..max maps to black..white.
	pub fn from_volume(volume: &Mrc, z: usize) -> Result<Self> {

		let (nx, ny, _) = volume.dims();
		let slice = volume.slice_z(z)?;

		let display = slice.iter()
			.map(|v| -v)
			.collect::<Vec<_>>();

		let (min, max) = display.iter()
			.filter(|v| v.is_finite())
			.fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| (min.min(v), max.max(v)));
		let range = max - min;

		let img = GrayImage::from_fn(nx, ny, |x, y| {
			let v = display[(y as usize)*(nx as usize) + (x as usize)];
			let level = if !v.is_finite() || range <= 0.0 {
				0.0
			} else {
				(v - min)/range*255.0
			};
			Luma([level.round().clamp(0.0, 255.0) as u8])
		});

		Ok(Self {
			img
		})
	}

	pub fn width(&self) -> u32 {
		self.img.width()
	}

	pub fn height(&self) -> u32 {
		self.img.height()
	}

	pub fn pixel(&self, x: u32, y: u32) -> u8 {
		self.img.get_pixel(x, y).0[0]
	}

	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		self.img.save(path)
			.context(format!("Failed to save image to: {}", path.to_string_lossy()))?;
		info!("Saved image: {}", path.to_string_lossy());
		Ok(())
	}
}


/// Renders slice `z` of the scaled and denoised versions of one tomogram.
/// Returns the two image paths, scaled first.
pub fn render_comparison(
	scaled_path: &Path,
	denoised_path: &Path,
	z: usize,
	out_dir: &Path
) -> Result<(PathBuf, PathBuf)> {

	let stem = scaled_path.file_stem()
		.context(format!("Tomogram path has no file name: {}", scaled_path.to_string_lossy()))?
		.to_string_lossy()
		.to_string();

	fs::create_dir_all(out_dir)
		.context(format!("Failed to create figures folder: {}", out_dir.to_string_lossy()))?;

	let scaled = Mrc::read(scaled_path)?;
	let scaled_out = out_dir.join(format!("{}_z{}_scaled.png", stem, z));
	SliceImage::from_volume(&scaled, z)?
		.save(&scaled_out)?;
	drop(scaled);

	let denoised = Mrc::read(denoised_path)?;
	let denoised_out = out_dir.join(format!("{}_z{}_denoised.png", stem, z));
	SliceImage::from_volume(&denoised, z)?
		.save(&denoised_out)?;

	Ok((scaled_out, denoised_out))
}
