//! Markov next-word model.
//!
//! - Tokenization of raw text (`tokenizer`)
//! - First-order transition counting (`TransitionTable`, `State`)
//! - Ranked and sampled prediction (`Predictor`)
//! - Descriptive statistics (`ModelStats`)
//! - An owned, explicit model state (`Session`)

/// Splits raw text into normalized word tokens.
pub mod tokenizer;

/// Word -> successor-count table built from a token sequence.
pub mod transition_table;

/// Successor counts of a single word.
///
/// Ranks successors and supports weighted random sampling.
pub mod state;

/// Top-k and weighted-random next-word queries.
pub mod predictor;

/// Vocabulary size, transition counts and summary scores.
pub mod stats;

/// Owns the trained table across training runs and queries.
///
/// Replaces any process-wide model with a value callers pass around.
pub mod session;
