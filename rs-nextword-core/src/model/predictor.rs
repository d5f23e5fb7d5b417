use rand::Rng;

use super::state::State;
use super::transition_table::TransitionTable;
use crate::error::{NextWordError, Result};

/// Read-only view answering next-word queries against a trained table.
///
/// Every query distinguishes two failure conditions:
/// - [`NextWordError::NotTrained`] when the table is empty
/// - [`NextWordError::UnknownPrefix`] when the prefix was never followed by a word
pub struct Predictor<'a> {
	table: &'a TransitionTable,
}

impl<'a> Predictor<'a> {
	/// Wraps `table` for querying.
	pub fn new(table: &'a TransitionTable) -> Self {
		Self { table }
	}

	fn state(&self, prefix: &str) -> Result<&'a State> {
		if self.table.is_empty() {
			return Err(NextWordError::NotTrained);
		}
		self.table
			.get(prefix)
			.ok_or_else(|| NextWordError::UnknownPrefix(prefix.to_owned()))
	}

	/// Returns up to `k` successors of `prefix`, most frequent first.
	///
	/// Ties keep the alphabetical order of [`State::ranked`]. `k == 0` gives an
	/// empty list, a `k` larger than the number of successors gives all of them.
	pub fn top_k(&self, prefix: &str, k: usize) -> Result<Vec<String>> {
		let state = self.state(prefix)?;
		Ok(state
			.ranked()
			.into_iter()
			.take(k)
			.map(|(word, _)| word.to_owned())
			.collect())
	}

	/// Picks one successor of `prefix` at random, weighted by observed counts.
	pub fn sample<R: Rng + ?Sized>(&self, prefix: &str, rng: &mut R) -> Result<String> {
		let state = self.state(prefix)?;
		state
			.sample(rng)
			.map(str::to_owned)
			.ok_or_else(|| NextWordError::UnknownPrefix(prefix.to_owned()))
	}

	/// Extends `prefix` by up to `max_words` sampled words.
	///
	/// The first step fails like [`Predictor::sample`]; afterwards generation
	/// simply stops on a word with no successor (ex. the last word of the text).
	pub fn continue_phrase<R: Rng + ?Sized>(
		&self,
		prefix: &str,
		max_words: usize,
		rng: &mut R,
	) -> Result<Vec<String>> {
		let mut phrase = Vec::with_capacity(max_words);
		if max_words == 0 {
			return Ok(phrase);
		}

		let mut current = self.sample(prefix, rng)?;
		loop {
			phrase.push(current);
			if phrase.len() >= max_words {
				break;
			}
			let last = phrase.last().map(String::as_str).unwrap_or_default();
			match self.table.get(last).and_then(|state| state.sample(rng)) {
				Some(next_word) => current = next_word.to_owned(),
				None => break,
			}
		}
		Ok(phrase)
	}
}
