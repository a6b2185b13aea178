//! Dream similarity search
//!
//! Query text is embedded by a remote provider, then diary entries that
//! already carry an embedding are ranked by cosine similarity.

pub mod engine;
pub mod error;
pub mod latest;
pub mod provider;
pub mod ranking;
pub mod similarity;

pub use engine::SearchEngine;
pub use error::{DimensionMismatch, EmbeddingError, InvalidThreshold, SearchError};
pub use latest::{SearchSequencer, SearchTicket, Sequenced};
pub use provider::{EmbeddingProvider, HttpEmbeddingProvider};
pub use ranking::{rank, related, ScoredEntry, SearchOptions, TieBreak};
pub use similarity::cosine_similarity;
