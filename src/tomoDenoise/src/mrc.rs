
// MRC file (from the Medical Research Council, in the UK)
// https://en.wikipedia.org/wiki/MRC_(file_format)

// format specification:
// https://www.ccpem.ac.uk/mrc_format/mrc2014.php

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt, BE, LE};
use tracing::debug;


const HEADER_BYTES: usize = 1024;
const LABEL_BYTES: usize = 80;
const NUM_LABELS: usize = 10;

const MODE_I8: i32 = 0;
const MODE_I16: i32 = 1;
const MODE_F32: i32 = 2;
const MODE_U16: i32 = 6;
const MODE_F16: i32 = 12;

const MACHST_LE: [u8; 4] = [0x44, 0x44, 0x00, 0x00];


/// Physical size of one voxel along each axis, in Angstroms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VoxelSize {
	pub x: f32,
	pub y: f32,
	pub z: f32
}


/// A volume of f32 samples stored in z(y(x)) order,
/// so the first (slowest) axis is Z.
#[derive(Debug, Clone, PartialEq)]
pub struct Mrc {
	nx: u32,
	ny: u32,
	nz: u32,
	voxels: Vec<f32>,
	voxel_size: VoxelSize
}

impl Mrc {

	pub fn new(nx: u32, ny: u32, nz: u32) -> Self {
		Self {
			nx,
			ny,
			nz,
			voxels: vec![0f32; (nx as usize)*(ny as usize)*(nz as usize)],
			voxel_size: VoxelSize::default()
		}
	}

	pub fn from_voxels(nx: u32, ny: u32, nz: u32, voxels: Vec<f32>) -> Result<Self> {
		let expected = num_voxels(nx, ny, nz)?;
		if voxels.len() != expected {
			bail!("Expected {} voxels for a {}x{}x{} volume, but got {}", expected, nx, ny, nz, voxels.len());
		}
		Ok(Self {
			nx,
			ny,
			nz,
			voxels,
			voxel_size: VoxelSize::default()
		})
	}

	pub fn dims(&self) -> (u32, u32, u32) {
		(self.nx, self.ny, self.nz)
	}

	pub fn voxels(&self) -> &[f32] {
		&self.voxels
	}

	/// Swaps in new samples, keeping the dimensions and voxel size.
	pub fn with_voxels(self, voxels: Vec<f32>) -> Result<Self> {
		let voxel_size = self.voxel_size;
		let mut out = Self::from_voxels(self.nx, self.ny, self.nz, voxels)?;
		out.voxel_size = voxel_size;
		Ok(out)
	}

	pub fn voxel_size(&self) -> VoxelSize {
		self.voxel_size
	}

	pub fn set_voxel_size(&mut self, voxel_size: VoxelSize) {
		self.voxel_size = voxel_size;
	}

	fn index(&self, x: u32, y: u32, z: u32) -> usize {
		let x = x as usize;
		let y = y as usize;
		let z = z as usize;
		let nx = self.nx as usize;
		let ny = self.ny as usize;
		z*nx*ny + y*nx + x
	}

	pub fn get(&self, x: u32, y: u32, z: u32) -> f32 {
		self.voxels[self.index(x, y, z)]
	}

	/// The samples of one Z section, in y(x) order.
	pub fn slice_z(&self, z: usize) -> Result<&[f32]> {
		if z >= self.nz as usize {
			bail!("Z slice {} is out of range for a volume with {} slices", z, self.nz);
		}
		let size = (self.nx as usize)*(self.ny as usize);
		Ok(&self.voxels[z*size .. (z + 1)*size])
	}

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {

		let path = path.as_ref();

		let file = File::open(path)
			.context(format!("Failed to open file for reading: {}", path.to_string_lossy()))?;
		let mut reader = BufReader::new(file);

		let mut header = [0u8; HEADER_BYTES];
		reader.read_exact(&mut header)
			.context(format!("Failed to read MRC header: {}", path.to_string_lossy()))?;

		let mrc = match header_order(&header) {
			Order::Little => Self::read_body::<LE>(&header, &mut reader),
			Order::Big => Self::read_body::<BE>(&header, &mut reader)
		}
			.context(format!("Failed to read MRC file: {}", path.to_string_lossy()))?;

		debug!("Read {}x{}x{} volume: {}", mrc.nx, mrc.ny, mrc.nz, path.to_string_lossy());

		Ok(mrc)
	}

	fn read_body<B: ByteOrder>(header: &[u8; HEADER_BYTES], reader: &mut impl Read) -> Result<Self> {

		let mut h = &header[..];

		// words 1-4: dimensions and mode
		let nx = dim(h.read_i32::<B>()?, "nx")?;
		let ny = dim(h.read_i32::<B>()?, "ny")?;
		let nz = dim(h.read_i32::<B>()?, "nz")?;
		let mode = h.read_i32::<B>()?;

		// words 5-7: nxstart, nystart, nzstart
		h = &h[4*3..];

		// words 8-10: sampling grid
		let mx = h.read_i32::<B>()?;
		let my = h.read_i32::<B>()?;
		let mz = h.read_i32::<B>()?;

		// words 11-13: cell dimensions in Angstroms
		let cella_x = h.read_f32::<B>()?;
		let cella_y = h.read_f32::<B>()?;
		let cella_z = h.read_f32::<B>()?;

		// word 24: extended header size, skipping words 14-23
		let mut h = &header[4*23..];
		let nsymbt = h.read_i32::<B>()?;
		if nsymbt < 0 {
			bail!("Negative extended header size: {}", nsymbt);
		}

		// skip the extended header
		let skipped = io::copy(&mut reader.by_ref().take(nsymbt as u64), &mut io::sink())
			.context("Failed to skip extended header")?;
		if skipped != nsymbt as u64 {
			bail!("File ended inside the extended header");
		}

		let n = num_voxels(nx, ny, nz)?;
		let bytes_per_voxel = match mode {
			MODE_I8 => 1,
			MODE_I16 | MODE_U16 | MODE_F16 => 2,
			MODE_F32 => 4,
			other => bail!("Unsupported MRC mode: {}", other)
		};
		let data_bytes = n.checked_mul(bytes_per_voxel)
			.context(format!("Volume too large: {}x{}x{} in mode {}", nx, ny, nz, mode))?;

		// read no more than the header promises, and don't trust it for the allocation size
		let mut data = Vec::new();
		reader.by_ref().take(data_bytes as u64)
			.read_to_end(&mut data)
			.context("Failed to read voxels")?;
		if data.len() != data_bytes {
			bail!("File too short for {} voxels in mode {}: expected {} bytes, found {}", n, mode, data_bytes, data.len());
		}

		let voxels = match mode {
			MODE_I8 => data.iter()
				.map(|&b| b as i8 as f32)
				.collect(),
			MODE_I16 => data.chunks_exact(2)
				.map(|c| B::read_i16(c) as f32)
				.collect(),
			MODE_U16 => data.chunks_exact(2)
				.map(|c| B::read_u16(c) as f32)
				.collect(),
			MODE_F16 => data.chunks_exact(2)
				.map(|c| f16_to_f32(B::read_u16(c)))
				.collect(),
			_ => {
				let mut voxels = vec![0f32; n];
				B::read_f32_into(&data, &mut voxels);
				voxels
			}
		};

		Ok(Self {
			nx,
			ny,
			nz,
			voxels,
			voxel_size: VoxelSize {
				x: cell_to_voxel(cella_x, mx),
				y: cell_to_voxel(cella_y, my),
				z: cell_to_voxel(cella_z, mz)
			}
		})
	}

	/// Writes the volume as mode 2 (32-bit float), little-endian.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {

		let path = path.as_ref();

		let mut file = File::create(path)
			.context(format!("Failed to open file for writing: {}", path.to_string_lossy()))?;
		let mut writer = BufWriter::new(&mut file);

		self.write(&mut writer)
			.context(format!("Failed to write MRC file: {}", path.to_string_lossy()))?;

		// write buffers should be flushed before dropping
		writer.flush()
			.context(format!("Failed to write MRC file: {}", path.to_string_lossy()))?;

		debug!("Wrote {}x{}x{} volume: {}", self.nx, self.ny, self.nz, path.to_string_lossy());

		Ok(())
	}

	fn write(&self, writer: &mut impl Write) -> Result<()> {

		let stats = Stats::of(&self.voxels);

		// the header is 256 (4-byte) words, or 1024 bytes total

		// words 1-4: dimensions and mode
		writer.write_u32::<LE>(self.nx)?;
		writer.write_u32::<LE>(self.ny)?;
		writer.write_u32::<LE>(self.nz)?;
		writer.write_i32::<LE>(MODE_F32)?;

		// words 5-7: start at the origin
		writer.write_all(&[0u8; 4*3])?;

		// words 8-10: one grid sample per voxel
		writer.write_u32::<LE>(self.nx)?;
		writer.write_u32::<LE>(self.ny)?;
		writer.write_u32::<LE>(self.nz)?;

		// words 11-16: cell dimensions and angles
		writer.write_f32::<LE>(self.voxel_size.x*(self.nx as f32))?;
		writer.write_f32::<LE>(self.voxel_size.y*(self.ny as f32))?;
		writer.write_f32::<LE>(self.voxel_size.z*(self.nz as f32))?;
		for _ in 0 .. 3 {
			writer.write_f32::<LE>(90.0)?;
		}

		// words 17-19: axis mapping, x columns, y rows, z sections
		writer.write_i32::<LE>(1)?;
		writer.write_i32::<LE>(2)?;
		writer.write_i32::<LE>(3)?;

		// words 20-22: density stats
		writer.write_f32::<LE>(stats.min)?;
		writer.write_f32::<LE>(stats.max)?;
		writer.write_f32::<LE>(stats.mean)?;

		// word 23: space group 1 marks a volume (0 would be an image stack)
		writer.write_i32::<LE>(1)?;

		// word 24: no extended header
		writer.write_i32::<LE>(0)?;

		// words 25-26 are unused, word 27 is exttyp
		writer.write_all(&[0u8; 4*3])?;

		// word 28: format version
		writer.write_i32::<LE>(20140)?;

		// words 29-49 are unused
		writer.write_all(&[0u8; 4*(50 - 29)])?;

		// words 50-52: origin
		writer.write_all(&[0u8; 4*3])?;

		// words 53-54: file type and machine stamp (little-endian, note 11)
		writer.write_all(b"MAP ")?;
		writer.write_all(&MACHST_LE)?;

		// word 55: rms deviation
		writer.write_f32::<LE>(stats.rms)?;

		// word 56 and the labels
		writer.write_i32::<LE>(1)?;
		let mut label = [b' '; LABEL_BYTES];
		let text = b"tomo-denoise: inverted and scaled";
		label[.. text.len()].copy_from_slice(text);
		writer.write_all(&label)?;
		writer.write_all(&[0u8; LABEL_BYTES*(NUM_LABELS - 1)])?;

		// the voxels, already in z(y(x)) order
		for &v in &self.voxels {
			writer.write_f32::<LE>(v)?;
		}

		Ok(())
	}
}


enum Order {
	Little,
	Big
}

fn header_order(header: &[u8; HEADER_BYTES]) -> Order {

	// the machine stamp is word 54
	match header[4*53] {
		0x44 | 0x41 => return Order::Little,
		0x11 => return Order::Big,
		_ => ()
	}

	// older files may not set the stamp, so guess from whichever order gives a sane mode
	let mode_le = LE::read_i32(&header[12..16]);
	if (0..=16).contains(&mode_le) {
		Order::Little
	} else {
		Order::Big
	}
}


fn dim(value: i32, name: &str) -> Result<u32> {
	u32::try_from(value)
		.context(format!("Invalid dimension {}: {}", name, value))
}


fn num_voxels(nx: u32, ny: u32, nz: u32) -> Result<usize> {
	(nx as usize).checked_mul(ny as usize)
		.and_then(|n| n.checked_mul(nz as usize))
		.context(format!("Volume too large: {}x{}x{}", nx, ny, nz))
}


/// Widens an IEEE 754 half-precision value. Every half is exactly representable as an f32.
fn f16_to_f32(bits: u16) -> f32 {

	let sign = ((bits >> 15) as u32) << 31;
	let exp = ((bits >> 10) & 0x1f) as u32;
	let frac = (bits & 0x3ff) as u32;

	let magnitude = match exp {

		// zero and subnormals: frac*2^-24
		0 => (frac as f32*2f32.powi(-24)).to_bits(),

		// infinities and NaNs
		0x1f => 0x7f80_0000 | (frac << 13),

		// rebias the exponent from 15 to 127
		_ => ((exp + 112) << 23) | (frac << 13)
	};

	f32::from_bits(sign | magnitude)
}


fn cell_to_voxel(cell: f32, samples: i32) -> f32 {
	if samples == 0 {
		0.0
	} else {
		cell/(samples as f32)
	}
}


struct Stats {
	min: f32,
	max: f32,
	mean: f32,
	rms: f32
}

impl Stats {

	/// Stats over the finite samples.
	/// With no finite samples, uses the MRC2014 convention for undetermined values: dmax < dmin, dmean < both, rms < 0.
	fn of(voxels: &[f32]) -> Self {

		let mut min = f64::INFINITY;
		let mut max = f64::NEG_INFINITY;
		let mut sum = 0f64;
		let mut count = 0usize;
		for &v in voxels.iter().filter(|v| v.is_finite()) {
			let v = v as f64;
			min = min.min(v);
			max = max.max(v);
			sum += v;
			count += 1;
		}

		if count == 0 {
			return Self {
				min: 0.0,
				max: -1.0,
				mean: -2.0,
				rms: -1.0
			};
		}

		let mean = sum/(count as f64);
		let var = voxels.iter()
			.filter(|v| v.is_finite())
			.map(|&v| {
				let d = v as f64 - mean;
				d*d
			})
			.sum::<f64>()/(count as f64);

		Self {
			min: min as f32,
			max: max as f32,
			mean: mean as f32,
			rms: var.sqrt() as f32
		}
	}
}
