mod util;


use assert_fs::TempDir;
use galvanic_assert::{assert_that, matchers::*};

use tomo_denoise::image::{render_comparison, SliceImage};
use tomo_denoise::logging;
use tomo_denoise::mrc::{Mrc, VoxelSize};


#[test]
fn slice_contrast() {
	let volume = util::ramp(3, 2, 2);

	// slice 1 holds 6..=11, displayed as -6..=-11, so the smallest input is white
	let img = SliceImage::from_volume(&volume, 1).unwrap();
	assert_that!(&img.width(), eq(3));
	assert_that!(&img.height(), eq(2));
	assert_that!(&img.pixel(0, 0), eq(255));
	assert_that!(&img.pixel(2, 1), eq(0));
	assert_that!(&img.pixel(1, 0), eq(204));
}


#[test]
fn flat_slice_is_black() {
	let volume = Mrc::new(2, 2, 1);
	let img = SliceImage::from_volume(&volume, 0).unwrap();
	assert_that!(&img.pixel(1, 1), eq(0));
}


#[test]
fn slice_out_of_range() {
	let volume = util::ramp(2, 2, 2);
	assert_that!(&SliceImage::from_volume(&volume, 2).is_err(), eq(true));
}


#[test]
fn comparison_pngs() {
	let _logging = logging::init_test();
	let dir = TempDir::new().unwrap();
	let scaled = dir.path().join("scaled").join("tomo.mrc");
	let denoised = dir.path().join("denoised").join("tomo.mrc");
	std::fs::create_dir_all(scaled.parent().unwrap()).unwrap();
	std::fs::create_dir_all(denoised.parent().unwrap()).unwrap();
	util::write_volume(&scaled, util::ramp(8, 5, 4), VoxelSize::default());
	util::write_volume(&denoised, util::ramp(8, 5, 4), VoxelSize::default());

	let figures = dir.path().join("figures");
	let (scaled_png, denoised_png) = render_comparison(&scaled, &denoised, 2, &figures).unwrap();

	assert_that!(&scaled_png, eq(figures.join("tomo_z2_scaled.png")));
	assert_that!(&denoised_png, eq(figures.join("tomo_z2_denoised.png")));
	for path in [scaled_png, denoised_png] {
		let img = image::open(&path).unwrap();
		assert_that!(&img.width(), eq(8));
		assert_that!(&img.height(), eq(5));
	}
}


#[test]
fn comparison_needs_denoised() {
	let _logging = logging::init_test();
	let dir = TempDir::new().unwrap();
	let scaled = dir.path().join("tomo.mrc");
	util::write_volume(&scaled, util::ramp(4, 4, 4), VoxelSize::default());

	let result = render_comparison(&scaled, &dir.path().join("missing.mrc"), 0, dir.path());
	assert_that!(&result.is_err(), eq(true));
}
