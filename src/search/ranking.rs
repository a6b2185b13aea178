//! Pure scoring pipeline: score, threshold, sort, truncate.
//!
//! Takes an already-computed query vector so it can be exercised without
//! any network access.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::error::InvalidThreshold;
use super::similarity::cosine_similarity;
use crate::core::entry::DiaryEntry;

/// Minimum similarity (exclusive) for an entry to be returned.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Maximum number of results returned.
pub const DEFAULT_LIMIT: usize = 5;

/// Ordering among entries with equal similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep candidate input order (stable sort).
    #[default]
    InputOrder,
    /// Entry identifier ascending, independent of input order.
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub threshold: f32,
    pub limit: usize,
    pub tie_break: TieBreak,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
            tie_break: TieBreak::default(),
        }
    }
}

impl SearchOptions {
    /// Threshold must be a finite value within the cosine range.
    pub fn validate(&self) -> Result<(), InvalidThreshold> {
        if self.threshold.is_finite() && (-1.0..=1.0).contains(&self.threshold) {
            Ok(())
        } else {
            Err(InvalidThreshold(self.threshold))
        }
    }
}

/// An entry together with its similarity to the query. Lives only for the
/// duration of one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntry<'a> {
    pub entry: &'a DiaryEntry,
    pub similarity: f32,
}

impl ScoredEntry<'_> {
    pub fn id(&self) -> &str {
        self.entry.id_or_placeholder()
    }
}

/// Rank `candidates` by cosine similarity to `query`.
///
/// Entries that are not searchable or whose vector length differs from the
/// query are skipped. Output is sorted descending, every similarity is
/// strictly above `options.threshold` and there are at most `options.limit`
/// results.
pub fn rank<'a>(
    query: &[f32],
    candidates: &'a [DiaryEntry],
    options: &SearchOptions,
) -> Vec<ScoredEntry<'a>> {
    let mut skipped = 0usize;

    let mut scored: Vec<ScoredEntry<'a>> = candidates
        .iter()
        .filter(|entry| entry.is_searchable())
        .filter_map(|entry| {
            let vector = entry.embedding.as_deref()?;
            match cosine_similarity(query, vector) {
                Ok(similarity) => Some(ScoredEntry { entry, similarity }),
                Err(mismatch) => {
                    skipped += 1;
                    tracing::trace!(
                        id = entry.id_or_placeholder(),
                        %mismatch,
                        "skipping candidate"
                    );
                    None
                }
            }
        })
        // NaN never passes this comparison
        .filter(|scored| scored.similarity > options.threshold)
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| tie_break(options.tie_break, a, b))
    });
    scored.truncate(options.limit);

    tracing::debug!(
        candidates = candidates.len(),
        skipped_dimension = skipped,
        returned = scored.len(),
        "ranked candidates"
    );

    scored
}

fn tie_break(mode: TieBreak, a: &ScoredEntry<'_>, b: &ScoredEntry<'_>) -> Ordering {
    match mode {
        TieBreak::InputOrder => Ordering::Equal,
        TieBreak::Identifier => a.entry.id.cmp(&b.entry.id),
    }
}

/// Entries similar to `source`, using its stored embedding as the query.
///
/// The source itself is never part of the result. Returns an empty list when
/// the source has no embedding.
pub fn related<'a>(
    source: &DiaryEntry,
    candidates: &'a [DiaryEntry],
    options: &SearchOptions,
) -> Vec<ScoredEntry<'a>> {
    let Some(query) = source.embedding.as_deref() else {
        return Vec::new();
    };

    // Rank without the cap first so dropping the source cannot shrink the
    // result below the limit.
    let uncapped = SearchOptions {
        limit: usize::MAX,
        ..*options
    };
    let mut results: Vec<_> = rank(query, candidates, &uncapped)
        .into_iter()
        .filter(|scored| scored.entry.id != source.id)
        .collect();
    results.truncate(options.limit);
    results
}
