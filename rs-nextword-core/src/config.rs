//! Runtime configuration for a prediction session.

use serde::{Deserialize, Serialize};

use crate::error::{NextWordError, Result};

/// Default number of suggestions returned by [`crate::model::session::Session::predict`].
pub const DEFAULT_TOP_K: usize = 3;

/// Default read size used when loading training files (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default upper bound on words produced by a phrase continuation.
pub const DEFAULT_MAX_PHRASE_WORDS: usize = 12;

/// Settings shared by training and prediction.
///
/// # Invariants
/// - `chunk_size` is strictly positive
/// - `max_phrase_words` is strictly positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorConfig {
	/// Number of ranked suggestions returned by default.
	pub top_k: usize,
	/// Bytes read per step while loading a training file.
	pub chunk_size: usize,
	/// Upper bound on words generated by a phrase continuation.
	pub max_phrase_words: usize,
}

impl Default for PredictorConfig {
	fn default() -> Self {
		Self {
			top_k: DEFAULT_TOP_K,
			chunk_size: DEFAULT_CHUNK_SIZE,
			max_phrase_words: DEFAULT_MAX_PHRASE_WORDS,
		}
	}
}

impl PredictorConfig {
	/// Returns a builder initialised with [`PredictorConfig::default`].
	#[must_use]
	pub fn builder() -> PredictorConfigBuilder {
		PredictorConfigBuilder::default()
	}

	/// Checks the invariants listed on the type.
	///
	/// # Errors
	/// Returns [`NextWordError::InvalidConfig`] naming the offending field.
	pub fn validate(&self) -> Result<()> {
		if self.chunk_size == 0 {
			return Err(NextWordError::InvalidConfig(
				"chunk_size must be greater than zero".into(),
			));
		}
		if self.max_phrase_words == 0 {
			return Err(NextWordError::InvalidConfig(
				"max_phrase_words must be greater than zero".into(),
			));
		}
		Ok(())
	}
}

/// Chained builder for [`PredictorConfig`].
#[derive(Debug, Clone, Default)]
pub struct PredictorConfigBuilder {
	config: PredictorConfig,
}

impl PredictorConfigBuilder {
	/// Sets the default number of suggestions.
	#[must_use]
	pub fn top_k(mut self, top_k: usize) -> Self {
		self.config.top_k = top_k;
		self
	}

	/// Sets the read size used while loading files.
	#[must_use]
	pub fn chunk_size(mut self, chunk_size: usize) -> Self {
		self.config.chunk_size = chunk_size;
		self
	}

	/// Sets the maximum length of a generated phrase.
	#[must_use]
	pub fn max_phrase_words(mut self, max_phrase_words: usize) -> Self {
		self.config.max_phrase_words = max_phrase_words;
		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<PredictorConfig> {
		self.config.validate()?;
		Ok(self.config)
	}
}
