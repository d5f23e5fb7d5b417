//! Error type shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = NextWordError> = std::result::Result<T, E>;

/// Failures raised while loading text, training, predicting or persisting a model.
///
/// Every variant is local to the operation that produced it: a failed
/// training run leaves the previously trained model untouched.
#[derive(Debug, Error)]
pub enum NextWordError {
	/// The training file could not be opened or read.
	#[error("io error while processing {path:?}: {source}")]
	Io {
		/// Underlying IO error returned by the standard library.
		source: std::io::Error,
		/// Path associated with the failure if available.
		path: Option<PathBuf>,
	},
	/// The training file is not valid UTF-8 text.
	#[error("{path:?} is not valid UTF-8 text")]
	Decode {
		/// Path of the undecodable file.
		path: PathBuf,
	},
	/// A prediction was requested before any non-empty training run.
	#[error("model is not trained, load training data first")]
	NotTrained,
	/// The prefix word never appeared with a successor in the training text.
	#[error("no prediction available for '{0}'")]
	UnknownPrefix(String),
	/// The typed text did not contain a single word.
	#[error("input contains no word to predict from")]
	EmptyPrefix,
	/// A configuration value failed validation.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
	/// Snapshot encoding or decoding failed.
	#[error("serialization error: {0}")]
	Serialization(String),
}

impl From<postcard::Error> for NextWordError {
	fn from(err: postcard::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}

impl NextWordError {
	/// Wraps an IO error, attaching the path it happened on.
	pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
		Self::Io { source, path }
	}
}
