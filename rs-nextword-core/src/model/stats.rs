use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::transition_table::TransitionTable;

/// Descriptive statistics of a trained table.
///
/// A pure function of the table: recomputed on demand, never cached.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelStats {
	/// Distinct tokens, including tokens that only appear as successors.
	pub vocab_size: usize,
	/// Distinct `(word, next_word)` pairs.
	pub unique_transitions: usize,
	/// Sum of all pair counts.
	pub total_transitions: usize,
	/// Harmonic mean of the repeated-pair ratios, see [`ModelStats::from_table`].
	pub repetition_f1: f64,
	/// `vocab_size / unique_transitions`, `None` without transitions.
	pub compression_ratio: Option<f64>,
}

impl ModelStats {
	/// Computes the statistics of `table`.
	///
	/// `repetition_f1` is a summary score, not a supervised metric. With
	/// `repeated` the number of pairs seen more than once:
	/// - precision = repeated / unique_transitions
	/// - recall = repeated / total_transitions
	/// - f1 = 2 * precision * recall / (precision + recall), or 0
	pub fn from_table(table: &TransitionTable) -> Self {
		let mut vocabulary: HashSet<&str> = HashSet::new();
		let mut unique_transitions = 0;
		let mut total_transitions = 0;
		let mut repeated = 0;

		for state in table.states() {
			vocabulary.insert(state.word());
			for (next_word, count) in state.transitions() {
				vocabulary.insert(next_word);
				unique_transitions += 1;
				total_transitions += count;
				if count > 1 {
					repeated += 1;
				}
			}
		}

		let precision = ratio(repeated, unique_transitions);
		let recall = ratio(repeated, total_transitions);
		let repetition_f1 = if precision + recall > 0.0 {
			2.0 * precision * recall / (precision + recall)
		} else {
			0.0
		};

		let vocab_size = vocabulary.len();
		Self {
			vocab_size,
			unique_transitions,
			total_transitions,
			repetition_f1,
			compression_ratio: (unique_transitions > 0)
				.then(|| vocab_size as f64 / unique_transitions as f64),
		}
	}
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
	if denominator == 0 {
		0.0
	} else {
		numerator as f64 / denominator as f64
	}
}
