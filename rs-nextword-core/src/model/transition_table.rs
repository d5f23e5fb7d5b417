use super::state::State;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// First-order Markov transition table over word tokens.
///
/// Maps every token that was followed by another token to its [`State`],
/// which holds the successor counts.
///
/// # Responsibilities
/// - Build the table from an ordered token sequence in a single linear pass
/// - Give read access to the per-word successor distributions
///
/// # Invariants
/// - Every key is a token that appeared in the training input
/// - Every state holds at least one transition (a key is only inserted
///   together with its first successor)
/// - Building from identical tokens gives an identical table
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionTable {
	/// Mapping from a word to its successor counts
	states: HashMap<String, State>,
}

impl TransitionTable {
	/// Creates an empty (untrained) table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts every adjacent pair `(tokens[i], tokens[i + 1])`.
	///
	/// A sequence shorter than two tokens yields an empty table.
	pub fn build<S: AsRef<str>>(tokens: &[S]) -> Self {
		let mut table = Self::new();
		for pair in tokens.windows(2) {
			let (word, next_word) = (pair[0].as_ref(), pair[1].as_ref());
			let state = table.states.entry(word.to_owned()).or_insert_with(|| State::new(word));
			state.add_transition(next_word);
		}
		table
	}

	/// Returns the successor distribution of `word`, if it was ever followed by anything.
	pub fn get(&self, word: &str) -> Option<&State> {
		self.states.get(word)
	}

	/// Number of words with at least one successor.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// An empty table is an untrained model.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Iterates over all states in no particular order.
	pub fn states(&self) -> impl Iterator<Item = &State> {
		self.states.values()
	}

	/// Iterates over the words that have successors.
	pub fn words(&self) -> impl Iterator<Item = &str> {
		self.states.keys().map(String::as_str)
	}
}
