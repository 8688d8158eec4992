#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

use tomo_denoise::mrc::{Mrc, VoxelSize};


pub fn bin_path() -> &'static Path {
	let bin_path = Path::new(env!("CARGO_BIN_EXE_tomo-denoise"));
	if !bin_path.exists() {
		panic!("Target binary not found at: {:?}", bin_path);
	}
	bin_path
}


/// A z-ramp volume: every voxel holds its linear index.
pub fn ramp(nx: u32, ny: u32, nz: u32) -> Mrc {
	let n = (nx*ny*nz) as usize;
	Mrc::from_voxels(nx, ny, nz, (0 .. n).map(|i| i as f32).collect())
		.expect("Failed to make ramp volume")
}


pub fn write_volume(path: impl AsRef<Path>, mut mrc: Mrc, voxel_size: VoxelSize) -> Mrc {
	mrc.set_voxel_size(voxel_size);
	mrc.save(path.as_ref())
		.expect(&format!("Failed to write volume: {}", path.as_ref().to_string_lossy()));
	mrc
}


/// Answers exactly one HTTP request, then hangs up.
/// Returns the URL to request.
pub fn serve_once(status: &'static str, body: Vec<u8>) -> String {

	let listener = TcpListener::bind("127.0.0.1:0")
		.expect("Failed to bind test server");
	let addr = listener.local_addr()
		.expect("Failed to get test server address");

	thread::spawn(move || {

		let Ok((mut stream, _)) = listener.accept()
			else { return; };

		// read the request headers, ignore them
		let mut request = Vec::<u8>::new();
		let mut buf = [0u8; 1024];
		loop {
			let Ok(n) = stream.read(&mut buf)
				else { return; };
			if n == 0 {
				break;
			}
			request.extend_from_slice(&buf[.. n]);
			if request.windows(4).any(|w| w == b"\r\n\r\n") {
				break;
			}
		}

		let head = format!("HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", status, body.len());
		stream.write_all(head.as_bytes()).ok();
		stream.write_all(&body).ok();
		stream.flush().ok();
	});

	format!("http://{}/denoising_model.ckpt", addr)
}
