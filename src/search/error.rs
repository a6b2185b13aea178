//! Error types for similarity search.

use std::time::Duration;

use thiserror::Error;

/// Failures while obtaining an embedding from the provider.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Endpoint URL could not be parsed.
    #[error("Invalid embedding endpoint '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// Transport-level failure (connect, TLS, body read).
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider answered with a non-success status.
    #[error("Embedding server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Success status but no usable numeric array.
    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Whole-operation failures of a similarity search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Query was empty after trimming; no request was made.
    #[error("Query text is empty")]
    InvalidQuery,

    /// Provider unreachable or unusable; no partial ranking is produced.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(#[source] EmbeddingError),
}

/// A candidate vector whose length differs from the query vector.
///
/// Never surfaced to callers of `search`: the candidate is skipped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Dimension mismatch: expected {expected}, found {found}")]
pub struct DimensionMismatch {
    pub expected: usize,
    pub found: usize,
}

/// A similarity threshold outside the cosine range [-1, 1], or NaN.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("threshold must be within [-1, 1], got {0}")]
pub struct InvalidThreshold(pub f32);
