
use std::cmp::Ordering;

use anyhow::{bail, Result};
use tracing::{debug, warn};


/// Percentile anchors for contrast scaling, as percentages in [0,100].
/// A missing anchor falls back to the raw extreme of the samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentiles {
	pub lower: Option<f64>,
	pub upper: Option<f64>
}

impl Percentiles {

	pub const DEFAULT_LOWER: f64 = 0.1;
	pub const DEFAULT_UPPER: f64 = 99.9;

	/// Plain min-max scaling, no outlier rejection.
	pub fn extremes() -> Self {
		Self {
			lower: None,
			upper: None
		}
	}
}

impl Default for Percentiles {

	fn default() -> Self {
		Self {
			lower: Some(Self::DEFAULT_LOWER),
			upper: Some(Self::DEFAULT_UPPER)
		}
	}
}


/// Flips the contrast, so dense material becomes bright.
pub fn invert(voxels: &[f32]) -> Vec<f32> {
	voxels.iter()
		.map(|v| -v)
		.collect()
}


/// Rescales the samples so the percentile bounds map to 0 and 1, then clips to [0,1].
///
/// When both bounds coincide (eg a constant volume), every sample becomes NaN.
/// That is logged, but the NaNs are returned as-is.
pub fn scale(voxels: &[f32], percentiles: Percentiles) -> Result<Vec<f32>> {

	if voxels.is_empty() {
		bail!("Can't scale an empty volume");
	}

	let min_val = match percentiles.lower {
		Some(p) => percentile(voxels, p)?,
		None => extreme(voxels, Ordering::Less)
	};
	let max_val = match percentiles.upper {
		Some(p) => percentile(voxels, p)?,
		None => extreme(voxels, Ordering::Greater)
	};
	debug!("Scaling bounds: [{}, {}]", min_val, max_val);

	let range = max_val - min_val;
	if range == 0.0 {
		warn!("Scaling bounds are equal ({}), output will be NaN", min_val);
	}

	let scaled = voxels.iter()
		.map(|&v| {
			let v = ((v as f64 - min_val)/range) as f32;
			// clamp keeps NaN as NaN
			v.clamp(0.0, 1.0)
		})
		.collect();

	Ok(scaled)
}


/// Inverts, then scales.
pub fn normalize(voxels: &[f32], percentiles: Percentiles) -> Result<Vec<f32>> {
	scale(&invert(voxels), percentiles)
}


/// The q-th percentile (q in [0,100]) of the samples,
/// linearly interpolated between the two closest ranks.
pub fn percentile(voxels: &[f32], q: f64) -> Result<f64> {

	if voxels.is_empty() {
		bail!("Can't take a percentile of no samples");
	}
	if !(0.0 ..= 100.0).contains(&q) {
		bail!("Percentile out of range [0,100]: {}", q);
	}

	let rank = q/100.0*((voxels.len() - 1) as f64);
	let lo = rank.floor() as usize;
	let frac = rank - (lo as f64);

	// partial selection is enough, we only need two order statistics
	let mut samples = voxels.to_vec();
	let (_, &mut lo_val, above) = samples.select_nth_unstable_by(lo, f32::total_cmp);
	let lo_val = lo_val as f64;
	if frac == 0.0 || above.is_empty() {
		return Ok(lo_val);
	}

	let hi_val = above.iter()
		.copied()
		.min_by(f32::total_cmp)
		.map(|v| v as f64)
		.unwrap_or(lo_val);

	Ok(lo_val + (hi_val - lo_val)*frac)
}


fn extreme(voxels: &[f32], which: Ordering) -> f64 {
	voxels.iter()
		.copied()
		.reduce(|a, b| {
			if b.total_cmp(&a) == which {
				b
			} else {
				a
			}
		})
		.map(|v| v as f64)
		.unwrap_or(f64::NAN)
}
