use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{NextWordError, Result};

/// Where a trained table came from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrainingSource {
	/// Base name of the training file (ex. `corpus.txt`).
	pub name: String,
	/// Size of the training input in bytes.
	pub size_bytes: u64,
}

impl TrainingSource {
	/// Describes text that did not come from a file.
	pub fn in_memory(text: &str) -> Self {
		Self { name: "<memory>".to_owned(), size_bytes: text.len() as u64 }
	}
}

/// Reads a training file in fixed-size chunks so callers can report progress.
///
/// - `read_chunk` advances by at most `chunk_size` bytes
/// - `finish` drains what is left and decodes the whole file as UTF-8
///
/// Nothing is decoded before `finish`, so a multibyte character split across
/// two chunks is never a problem.
#[derive(Debug)]
pub struct TextLoader {
	path: PathBuf,
	file: File,
	chunk: Vec<u8>,
	contents: Vec<u8>,
	total_bytes: u64,
	done: bool,
}

impl TextLoader {
	/// Opens `path` for chunked reading.
	///
	/// # Errors
	/// Returns [`NextWordError::Io`] if the file is missing or unreadable,
	/// and [`NextWordError::InvalidConfig`] if `chunk_size` is zero.
	pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
		if chunk_size == 0 {
			return Err(NextWordError::InvalidConfig("chunk_size must be greater than zero".into()));
		}
		let path = path.as_ref().to_path_buf();
		let file = File::open(&path).map_err(|e| NextWordError::io(e, Some(path.clone())))?;
		let total_bytes = file
			.metadata()
			.map_err(|e| NextWordError::io(e, Some(path.clone())))?
			.len();

		Ok(Self {
			path,
			file,
			chunk: vec![0; chunk_size],
			contents: Vec::with_capacity(usize::try_from(total_bytes).unwrap_or(0)),
			total_bytes,
			done: false,
		})
	}

	/// Reads the next chunk. Returns `true` once the end of file is reached.
	pub fn read_chunk(&mut self) -> Result<bool> {
		if self.done {
			return Ok(true);
		}
		let read = read_retrying(&mut self.file, &mut self.chunk)
			.map_err(|e| NextWordError::io(e, Some(self.path.clone())))?;
		if read == 0 {
			self.done = true;
		} else {
			self.contents.extend_from_slice(&self.chunk[..read]);
			debug!("read {} / {} bytes from {}", self.contents.len(), self.total_bytes, self.path.display());
		}
		Ok(self.done)
	}

	/// Bytes read so far.
	pub fn read_bytes(&self) -> u64 {
		self.contents.len() as u64
	}

	/// File size reported when the file was opened.
	pub fn total_bytes(&self) -> u64 {
		self.total_bytes
	}

	/// Fraction of the file read so far, in `[0, 1]`.
	pub fn progress(&self) -> f32 {
		if self.done {
			return 1.0;
		}
		if self.total_bytes == 0 {
			return 0.0;
		}
		(self.read_bytes() as f64 / self.total_bytes as f64).min(1.0) as f32
	}

	/// Whether the end of file was reached.
	pub fn is_done(&self) -> bool {
		self.done
	}

	/// Path being read.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads whatever is left and decodes the file.
	///
	/// # Errors
	/// Returns [`NextWordError::Decode`] if the bytes are not valid UTF-8.
	pub fn finish(mut self) -> Result<(TrainingSource, String)> {
		while !self.read_chunk()? {}
		let source = TrainingSource {
			name: file_name(&self.path),
			size_bytes: self.read_bytes(),
		};
		let text = String::from_utf8(self.contents).map_err(|_| NextWordError::Decode { path: self.path })?;
		Ok((source, text))
	}
}

/// Reads into `buf`, retrying reads interrupted by a signal.
fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
	loop {
		match reader.read(buf) {
			Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
			result => return result,
		}
	}
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path.file_stem().ok_or_else(|| {
		NextWordError::io(
			std::io::Error::new(std::io::ErrorKind::InvalidInput, "Input path has no filename"),
			Some(input_path.to_path_buf()),
		)
	})?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename, extension included.
///
/// Examples:
/// - `"./data/corpus.txt"` → `"corpus.txt"`
/// - `"/"` → `"/"`
pub fn file_name<P: AsRef<Path>>(path: P) -> String {
	let path = path.as_ref();
	match path.file_name() {
		Some(name) => name.to_string_lossy().to_string(),
		None => path.display().to_string(),
	}
}
