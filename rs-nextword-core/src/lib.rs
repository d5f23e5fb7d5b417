//! First-order Markov next-word prediction.
//!
//! This crate provides:
//! - Word tokenization with punctuation stripping and case folding
//! - Transition-table training over a word sequence
//! - Deterministic top-k prediction and weighted-random sampling
//! - Model statistics and postcard snapshots
//!
//! The entry point is [`model::session::Session`], which owns one trained
//! model. Front-ends call it directly and render the returned values.

/// Tokenizer, transition table, predictor, statistics and session.
pub mod model;

/// Chunked training-file loading and path helpers.
pub mod io;

/// Session settings and their validation.
pub mod config;

/// Error type and `Result` alias.
pub mod error;

pub use config::PredictorConfig;
pub use error::{NextWordError, Result};
pub use io::{TextLoader, TrainingSource};
pub use model::session::{Session, TrainingReport};
pub use model::stats::ModelStats;
