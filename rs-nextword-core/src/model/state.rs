use std::collections::HashMap;

use rand::Rng;

use serde::{Deserialize, Serialize};


/// Successor counts observed after a single word.
///
/// A `State` is a node of the first-order Markov chain: `word` is the current
/// token and `transitions` holds every token seen immediately after it,
/// weighted by how many times that pair was observed.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Rank successors deterministically for top-k prediction
/// - Pick a successor by weighted random sampling
///
/// ## Invariants
/// - All transitions belong to the same `word`
/// - Each transition occurrence count is strictly positive
/// - A state stored in a table always holds at least one transition
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct State {
	/// The current word.
	word: String,
	/// Outgoing transitions indexed by the next word.
	/// Example: { "cat" => 2, "dog" => 1 }
	transitions: HashMap<String, usize>,
}

impl State {
	/// Creates a new empty state for the given word.
	pub(crate) fn new(word: &str) -> Self {
		Self {
			word: word.to_owned(),
			transitions: HashMap::new(),
		}
	}

	/// Records one more occurrence of `word -> next_word`.
	pub(crate) fn add_transition(&mut self, next_word: &str) {
		if let Some(occurrence) = self.transitions.get_mut(next_word) {
			*occurrence += 1;
		} else {
			self.transitions.insert(next_word.to_owned(), 1);
		}
	}

	/// The word this state describes.
	pub fn word(&self) -> &str {
		&self.word
	}

	/// How many times `next_word` followed this word.
	pub fn count(&self, next_word: &str) -> usize {
		self.transitions.get(next_word).copied().unwrap_or(0)
	}

	/// Number of distinct successors.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	/// Whether no successor was recorded.
	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Sum of all successor counts, i.e. how often this word was followed by anything.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Iterates over `(next_word, count)` pairs in no particular order.
	pub fn transitions(&self) -> impl Iterator<Item = (&str, usize)> {
		self.transitions.iter().map(|(word, count)| (word.as_str(), *count))
	}

	/// Successors ranked by descending count.
	///
	/// Ties are broken by ascending lexicographic order of the successor so the
	/// ranking is identical across calls and across rebuilt tables.
	pub fn ranked(&self) -> Vec<(&str, usize)> {
		let mut ranked: Vec<(&str, usize)> = self.transitions().collect();
		ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
		ranked
	}

	/// Picks a successor with probability proportional to its count.
	///
	/// Walks the ranked successors so a seeded `rng` gives reproducible picks.
	/// Returns `None` if the state has no transitions.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		let total = self.total();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);
		let ranked = self.ranked();
		for (next_word, occurrence) in &ranked {
			if r < *occurrence {
				return Some(*next_word);
			}
			r -= occurrence;
		}

		// Unreachable while counts sum to `total`
		ranked.last().map(|(next_word, _)| *next_word)
	}
}
