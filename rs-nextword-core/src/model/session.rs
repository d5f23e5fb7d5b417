use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::predictor::Predictor;
use super::stats::ModelStats;
use super::tokenizer::{last_token, tokenize};
use super::transition_table::TransitionTable;
use crate::config::PredictorConfig;
use crate::error::{NextWordError, Result};
use crate::io::{TextLoader, TrainingSource};

/// Version written in every snapshot; bumped when the layout changes.
const SNAPSHOT_VERSION: u16 = 1;

/// On-disk form of a trained session.
#[derive(Serialize, Deserialize)]
struct Snapshot {
	version: u16,
	source: Option<TrainingSource>,
	table: TransitionTable,
}

/// Outcome of a successful training run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainingReport {
	/// File (or in-memory text) the table was built from.
	pub source: TrainingSource,
	/// Wall time spent tokenizing and building the table.
	pub elapsed: Duration,
	/// Number of tokens produced by the tokenizer.
	pub token_count: usize,
	/// Statistics of the freshly built table.
	pub stats: ModelStats,
}

/// Owns one trained model and answers queries against it.
///
/// A session is either untrained (empty table) or trained (non-empty table
/// built by the most recent training run). Training replaces the table
/// wholesale; a failed run leaves the previous table and report untouched.
///
/// # Responsibilities
/// - Load training text from files, optionally reporting progress
/// - Build and own the [`TransitionTable`]
/// - Answer prediction and statistics queries
/// - Save and restore snapshots
#[derive(Debug, Default)]
pub struct Session {
	config: PredictorConfig,
	table: TransitionTable,
	source: Option<TrainingSource>,
	last_report: Option<TrainingReport>,
}

impl Session {
	/// Creates an untrained session.
	pub fn new(config: PredictorConfig) -> Self {
		Self { config, ..Self::default() }
	}

	/// Settings this session was created with.
	pub fn config(&self) -> &PredictorConfig {
		&self.config
	}

	/// The current transition table, empty while untrained.
	pub fn table(&self) -> &TransitionTable {
		&self.table
	}

	/// Source of the current table, if any.
	pub fn source(&self) -> Option<&TrainingSource> {
		self.source.as_ref()
	}

	/// Report of the most recent successful training run.
	pub fn last_report(&self) -> Option<&TrainingReport> {
		self.last_report.as_ref()
	}

	/// Whether the current table holds at least one transition.
	pub fn is_trained(&self) -> bool {
		!self.table.is_empty()
	}

	/// Trains on `text`, replacing the current table.
	///
	/// Empty (or single-word) text leaves the session untrained.
	pub fn train_text(&mut self, text: &str, source: TrainingSource) -> TrainingReport {
		let start = Instant::now();
		let tokens = tokenize(text);
		let table = TransitionTable::build(&tokens);
		let elapsed = start.elapsed();

		let stats = ModelStats::from_table(&table);
		if table.is_empty() {
			warn!("training on {} produced an empty table ({} tokens)", source.name, tokens.len());
		} else {
			info!(
				"trained on {} in {:.3}s: {} tokens, {} words, {} unique transitions",
				source.name,
				elapsed.as_secs_f64(),
				tokens.len(),
				stats.vocab_size,
				stats.unique_transitions
			);
		}

		let report = TrainingReport { source: source.clone(), elapsed, token_count: tokens.len(), stats };
		self.table = table;
		self.source = Some(source);
		self.last_report = Some(report.clone());
		report
	}

	/// Reads `path` and trains on its contents.
	pub fn train_file<P: AsRef<Path>>(&mut self, path: P) -> Result<TrainingReport> {
		self.train_file_with_progress(path, |_, _| {})
	}

	/// Reads `path` chunk by chunk, calling `progress(read_bytes, total_bytes)`
	/// after each chunk, then trains on the contents.
	pub fn train_file_with_progress<P, F>(&mut self, path: P, mut progress: F) -> Result<TrainingReport>
	where
		P: AsRef<Path>,
		F: FnMut(u64, u64),
	{
		let mut loader = TextLoader::open(path, self.config.chunk_size)?;
		while !loader.read_chunk()? {
			progress(loader.read_bytes(), loader.total_bytes());
		}
		progress(loader.read_bytes(), loader.total_bytes());
		self.train_loader(loader)
	}

	/// Finishes an already started chunked load and trains on it.
	///
	/// Used by front-ends that drive [`TextLoader::read_chunk`] themselves.
	pub fn train_loader(&mut self, loader: TextLoader) -> Result<TrainingReport> {
		let (source, text) = loader.finish()?;
		Ok(self.train_text(&text, source))
	}

	fn prefix(&self, text: &str) -> Result<String> {
		if !self.is_trained() {
			return Err(NextWordError::NotTrained);
		}
		last_token(text).ok_or(NextWordError::EmptyPrefix)
	}

	/// Ranked suggestions for the last word of `text`, `config.top_k` of them at most.
	pub fn predict(&self, text: &str) -> Result<Vec<String>> {
		self.predict_top(text, self.config.top_k)
	}

	/// Ranked suggestions for the last word of `text`, `k` of them at most.
	pub fn predict_top(&self, text: &str, k: usize) -> Result<Vec<String>> {
		let prefix = self.prefix(text)?;
		Predictor::new(&self.table).top_k(&prefix, k)
	}

	/// One weighted-random successor of the last word of `text`.
	pub fn sample_next<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Result<String> {
		let prefix = self.prefix(text)?;
		Predictor::new(&self.table).sample(&prefix, rng)
	}

	/// Continues `text` with up to `max_words` sampled words.
	///
	/// `max_words` is capped by `config.max_phrase_words`.
	pub fn continue_phrase<R: Rng + ?Sized>(&self, text: &str, max_words: usize, rng: &mut R) -> Result<Vec<String>> {
		let prefix = self.prefix(text)?;
		let max_words = max_words.min(self.config.max_phrase_words);
		Predictor::new(&self.table).continue_phrase(&prefix, max_words, rng)
	}

	/// Statistics of the current table.
	pub fn stats(&self) -> Result<ModelStats> {
		if !self.is_trained() {
			return Err(NextWordError::NotTrained);
		}
		Ok(ModelStats::from_table(&self.table))
	}

	/// Writes the current table to `path` with `postcard`.
	///
	/// The file is written to a temporary sibling first and then renamed.
	pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let parent = match path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};
		fs::create_dir_all(parent).map_err(|e| NextWordError::io(e, Some(parent.to_path_buf())))?;

		let snapshot = Snapshot {
			version: SNAPSHOT_VERSION,
			source: self.source.clone(),
			table: self.table.clone(),
		};
		let bytes = postcard::to_stdvec(&snapshot)?;

		let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| NextWordError::io(e, Some(parent.to_path_buf())))?;
		temp_file
			.write_all(&bytes)
			.map_err(|e| NextWordError::io(e, Some(temp_file.path().to_path_buf())))?;
		temp_file
			.persist(path)
			.map_err(|e| NextWordError::io(e.error, Some(path.to_path_buf())))?;

		debug!("saved {} byte snapshot to {}", bytes.len(), path.display());
		Ok(())
	}

	/// Restores a session saved with [`Session::save_snapshot`].
	pub fn load_snapshot<P: AsRef<Path>>(path: P, config: PredictorConfig) -> Result<Self> {
		let path = path.as_ref();
		let bytes = fs::read(path).map_err(|e| NextWordError::io(e, Some(path.to_path_buf())))?;
		let snapshot: Snapshot = postcard::from_bytes(&bytes)?;
		if snapshot.version != SNAPSHOT_VERSION {
			return Err(NextWordError::Serialization(format!(
				"unsupported snapshot version {} (expected {})",
				snapshot.version, SNAPSHOT_VERSION
			)));
		}

		debug!("loaded snapshot {} ({} words)", path.display(), snapshot.table.len());
		Ok(Self {
			config,
			table: snapshot.table,
			source: snapshot.source,
			last_report: None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn trained(text: &str) -> Session {
		let mut session = Session::default();
		session.train_text(text, TrainingSource::in_memory(text));
		session
	}

	#[test]
	fn predicts_from_last_word_of_text() {
		let session = trained("the cat sat the cat ran");
		assert_eq!(session.predict("I saw THE").unwrap(), vec!["cat"]);
		assert_eq!(session.predict("the cat").unwrap(), vec!["ran", "sat"]);
		assert_eq!(session.predict_top("the cat", 1).unwrap(), vec!["ran"]);
	}

	#[test]
	fn untrained_session_refuses_to_guess() {
		let session = Session::default();
		assert!(!session.is_trained());
		assert!(matches!(session.predict("the"), Err(NextWordError::NotTrained)));
		assert!(matches!(session.stats(), Err(NextWordError::NotTrained)));
		// untrained wins over an empty prefix
		assert!(matches!(session.predict("  "), Err(NextWordError::NotTrained)));
	}

	#[test]
	fn empty_training_text_keeps_session_untrained() {
		let mut session = Session::default();
		let report = session.train_text("", TrainingSource::in_memory(""));
		assert_eq!(report.token_count, 0);
		assert!(session.table().is_empty());
		assert!(matches!(session.predict("anything"), Err(NextWordError::NotTrained)));
	}

	#[test]
	fn not_trained_is_distinct_from_unknown_prefix() {
		let session = trained("the cat sat");
		assert!(matches!(session.predict("dog"), Err(NextWordError::UnknownPrefix(w)) if w == "dog"));
		assert!(matches!(session.predict("  ...  "), Err(NextWordError::EmptyPrefix)));
	}

	#[test]
	fn retraining_replaces_the_table() {
		let mut session = trained("the cat sat");
		session.train_text("a dog ran", TrainingSource::in_memory("a dog ran"));
		assert!(matches!(session.predict("the"), Err(NextWordError::UnknownPrefix(_))));
		assert_eq!(session.predict("dog").unwrap(), vec!["ran"]);
	}

	#[test]
	fn failed_file_load_keeps_previous_model() {
		let dir = tempfile::tempdir().unwrap();
		let mut session = trained("the cat sat");
		let before = session.table().clone();

		let err = session.train_file(dir.path().join("missing.txt")).unwrap_err();
		assert!(matches!(err, NextWordError::Io { .. }));

		let bad = dir.path().join("bad.txt");
		fs::write(&bad, [0xc3, 0x28]).unwrap();
		assert!(matches!(session.train_file(&bad), Err(NextWordError::Decode { .. })));

		assert_eq!(session.table(), &before);
		assert_eq!(session.predict("the").unwrap(), vec!["cat"]);
	}

	#[test]
	fn file_training_reports_progress_and_source() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("story.txt");
		fs::write(&path, "one fish two fish red fish blue fish").unwrap();

		let config = PredictorConfig::builder().chunk_size(5).build().unwrap();
		let mut session = Session::new(config);
		let mut calls = Vec::new();
		let report = session
			.train_file_with_progress(&path, |read, total| calls.push((read, total)))
			.unwrap();

		assert!(calls.len() > 1);
		assert_eq!(calls.last(), Some(&(36, 36)));
		assert_eq!(report.source.name, "story.txt");
		assert_eq!(report.token_count, 8);
		assert_eq!(session.predict("fish").unwrap(), vec!["blue", "red", "two"]);
		assert_eq!(session.last_report(), Some(&report));
	}

	#[test]
	fn identical_text_trains_identical_tables() {
		let text = "to be or not to be that is the question";
		assert_eq!(trained(text).table(), trained(text).table());
	}

	#[test]
	fn snapshot_preserves_the_table() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("models").join("cat.bin");
		let session = trained("the cat sat the cat ran");
		session.save_snapshot(&path).unwrap();

		let restored = Session::load_snapshot(&path, PredictorConfig::default()).unwrap();
		assert_eq!(restored.table(), session.table());
		assert_eq!(restored.source().map(|s| s.name.as_str()), Some("<memory>"));
		assert_eq!(restored.predict("cat").unwrap(), vec!["ran", "sat"]);
		assert!(restored.last_report().is_none());
	}

	#[test]
	fn newer_snapshot_version_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("future.bin");
		let snapshot = Snapshot {
			version: SNAPSHOT_VERSION + 1,
			source: None,
			table: trained("the cat sat").table().clone(),
		};
		fs::write(&path, postcard::to_stdvec(&snapshot).unwrap()).unwrap();

		let err = Session::load_snapshot(&path, PredictorConfig::default()).unwrap_err();
		assert!(matches!(err, NextWordError::Serialization(msg) if msg.contains("unsupported snapshot version")));
	}

	#[test]
	fn garbage_snapshot_is_serialization_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("junk.bin");
		fs::write(&path, [0xff; 3]).unwrap();
		assert!(matches!(
			Session::load_snapshot(&path, PredictorConfig::default()),
			Err(NextWordError::Serialization(_))
		));
	}

	#[test]
	fn phrase_length_is_capped_by_config() {
		let config = PredictorConfig::builder().max_phrase_words(3).build().unwrap();
		let mut session = Session::new(config);
		session.train_text("la la la la la la", TrainingSource::in_memory(""));
		let mut rng = StdRng::seed_from_u64(5);
		assert_eq!(session.continue_phrase("la", 100, &mut rng).unwrap().len(), 3);
		assert_eq!(session.sample_next("la", &mut rng).unwrap(), "la");
	}
}
