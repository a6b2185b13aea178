use std::collections::HashMap;

use super::entry::DiaryEntry;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryIssue {
    MissingId,
    EmptyTitle,
    InvalidDate(String),
    MissingEmbedding,
    DimensionMismatch { expected: usize, found: usize },
}

impl EntryIssue {
    /// Informational issues do not make the snapshot invalid; such entries
    /// are simply left out of similarity search.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::MissingEmbedding | Self::DimensionMismatch { .. })
    }
}

impl std::fmt::Display for EntryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "Missing entry id"),
            Self::EmptyTitle => write!(f, "Title is empty"),
            Self::InvalidDate(d) => write!(f, "Invalid date '{}' (expected YYYY-MM-DD)", d),
            Self::MissingEmbedding => write!(f, "No embedding (excluded from similarity search)"),
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "Embedding has {} dimensions, dataset uses {} (excluded from similarity search)",
                found, expected
            ),
        }
    }
}

/// Most common embedding length in the snapshot; ties go to the smaller one.
pub fn dominant_dimension(entries: &[DiaryEntry]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for dim in entries.iter().filter_map(DiaryEntry::embedding_dim) {
        *counts.entry(dim).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(dim_a, n_a), (dim_b, n_b)| n_a.cmp(n_b).then(dim_b.cmp(dim_a)))
        .map(|(dim, _)| dim)
}

pub fn validate_entry(entry: &DiaryEntry, expected_dim: Option<usize>) -> Vec<EntryIssue> {
    let mut issues = Vec::new();

    if !entry.has_id() {
        issues.push(EntryIssue::MissingId);
    }
    if entry.title.trim().is_empty() {
        issues.push(EntryIssue::EmptyTitle);
    }
    if let Some(date) = &entry.date {
        if entry.day().is_none() {
            issues.push(EntryIssue::InvalidDate(date.clone()));
        }
    }
    match (entry.embedding_dim(), expected_dim) {
        (None, _) => issues.push(EntryIssue::MissingEmbedding),
        (Some(found), Some(expected)) if found != expected => {
            issues.push(EntryIssue::DimensionMismatch { expected, found })
        }
        _ => {}
    }

    issues
}
