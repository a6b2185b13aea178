//! Aggregate diary statistics: emotions, tags, months and recent entries.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use super::entry::DiaryEntry;

pub const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiaryStats {
    pub total_entries: usize,
    pub searchable_entries: usize,
    pub emotion_counts: BTreeMap<String, usize>,
    pub tag_counts: BTreeMap<String, usize>,
    /// Entries per `YYYY-MM`.
    pub monthly_counts: BTreeMap<String, usize>,
    pub recent: Vec<RecentEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecentEntry {
    pub id: Option<String>,
    pub title: String,
    pub date: Option<String>,
    pub emotion: Option<String>,
}

impl DiaryStats {
    pub fn collect(entries: &[DiaryEntry]) -> Self {
        let mut emotion_counts = BTreeMap::new();
        let mut tag_counts = BTreeMap::new();
        let mut monthly_counts = BTreeMap::new();

        for entry in entries {
            let emotion = entry.emotion.as_deref().map(str::trim);
            if let Some(emotion) = emotion.filter(|e| !e.is_empty()) {
                *emotion_counts.entry(emotion.to_string()).or_insert(0) += 1;
            }
            for tag in entry.unique_tags() {
                *tag_counts.entry(tag.to_string()).or_insert(0) += 1;
            }
            if let Some(month) = entry.month_key() {
                *monthly_counts.entry(month).or_insert(0) += 1;
            }
        }

        Self {
            total_entries: entries.len(),
            searchable_entries: entries.iter().filter(|e| e.is_searchable()).count(),
            emotion_counts,
            tag_counts,
            monthly_counts,
            recent: most_recent(entries, RECENT_ENTRIES),
        }
    }

    pub fn top_emotions(&self, n: usize) -> Vec<(&str, usize)> {
        top_counts(&self.emotion_counts, n)
    }

    pub fn top_tags(&self, n: usize) -> Vec<(&str, usize)> {
        top_counts(&self.tag_counts, n)
    }

    pub fn busiest_month(&self) -> Option<(&str, usize)> {
        top_counts(&self.monthly_counts, 1).into_iter().next()
    }
}

fn top_counts(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut sorted: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    // BTreeMap iteration is already name-ascending; stable sort keeps it for ties
    sorted.sort_by_key(|&(_, count)| Reverse(count));
    sorted.truncate(n);
    sorted
}

/// Newest first by creation time, then by diary date; file order breaks ties.
fn most_recent(entries: &[DiaryEntry], n: usize) -> Vec<RecentEntry> {
    let mut ordered: Vec<&DiaryEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| Reverse((e.created(), e.day())));
    ordered
        .into_iter()
        .take(n)
        .map(|e| RecentEntry {
            id: e.id.clone(),
            title: e.title.clone(),
            date: e.date.clone(),
            emotion: e.emotion.clone(),
        })
        .collect()
}
