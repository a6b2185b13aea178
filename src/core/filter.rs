use anyhow::Result;
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

use super::entry::DiaryEntry;

/// Where a keyword filter matched an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchField {
    Title,
    Tag(String),
    Content { start: usize, end: usize },
}

/// Keyword, tag and date filter over diary entries.
///
/// Criteria combine with AND; an absent criterion matches everything.
#[derive(Debug, Default)]
pub struct EntryFilter {
    text: Option<Regex>,
    tag: Option<String>,
    date: Option<NaiveDate>,
}

impl EntryFilter {
    pub fn new(text: Option<&str>, tag: Option<&str>, date: Option<NaiveDate>) -> Result<Self> {
        let text = match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(
                RegexBuilder::new(&regex::escape(t))
                    .case_insensitive(true)
                    .build()?,
            ),
            None => None,
        };
        let tag = tag.map(str::trim).filter(|t| !t.is_empty()).map(String::from);
        Ok(Self { text, tag, date })
    }

    pub fn matches(&self, entry: &DiaryEntry) -> bool {
        let tag_ok = self
            .tag
            .as_ref()
            .map_or(true, |tag| entry.tags.iter().any(|t| t == tag));
        let date_ok = self.date.map_or(true, |d| entry.day() == Some(d));
        tag_ok && date_ok && (self.text.is_none() || self.text_match(entry).is_some())
    }

    /// First field the keyword matched, checked in title, tag, content order.
    pub fn text_match(&self, entry: &DiaryEntry) -> Option<MatchField> {
        let re = self.text.as_ref()?;
        if re.is_match(&entry.title) {
            return Some(MatchField::Title);
        }
        if let Some(tag) = entry.tags.iter().find(|t| re.is_match(t)) {
            return Some(MatchField::Tag(tag.clone()));
        }
        re.find(&entry.content).map(|m| MatchField::Content {
            start: m.start(),
            end: m.end(),
        })
    }

    pub fn apply<'a>(&self, entries: &'a [DiaryEntry]) -> Vec<&'a DiaryEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, content: &str, tags: &[&str], date: &str) -> DiaryEntry {
        DiaryEntry {
            id: Some(title.to_lowercase()),
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn sample() -> Vec<DiaryEntry> {
        vec![
            entry("Ocean", "I was swimming with whales", &["water", "animals"], "2024-01-10"),
            entry("Exam", "Forgot my pencil again", &["school"], "2024-01-11"),
            entry("바다", "고래와 함께 수영했다", &["water"], "2024-02-01"),
        ]
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let entries = sample();
        let filter = EntryFilter::new(Some("   "), None, None).unwrap();
        assert_eq!(filter.apply(&entries).len(), 3);
    }

    #[test]
    fn test_text_case_insensitive() {
        let entries = sample();
        let filter = EntryFilter::new(Some("WHALES"), None, None).unwrap();
        let matched = filter.apply(&entries);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].title, "Ocean");
        assert!(matches!(
            filter.text_match(matched[0]),
            Some(MatchField::Content { .. })
        ));
    }

    #[test]
    fn test_text_matches_tag() {
        let entries = sample();
        let filter = EntryFilter::new(Some("school"), None, None).unwrap();
        let matched = filter.apply(&entries);
        assert_eq!(matched.len(), 1);
        assert_eq!(
            filter.text_match(matched[0]),
            Some(MatchField::Tag("school".to_string()))
        );
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let entries = vec![entry("What?", "", &[], "2024-01-01")];
        let filter = EntryFilter::new(Some("?"), None, None).unwrap();
        assert_eq!(filter.apply(&entries).len(), 1);
        let filter = EntryFilter::new(Some(".*x"), None, None).unwrap();
        assert!(filter.apply(&entries).is_empty());
    }

    #[test]
    fn test_tag_and_date_combine() {
        let entries = sample();
        let filter = EntryFilter::new(None, Some("water"), None).unwrap();
        assert_eq!(filter.apply(&entries).len(), 2);

        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let filter = EntryFilter::new(None, Some("water"), Some(day)).unwrap();
        let matched = filter.apply(&entries);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].title, "바다");

        let filter = EntryFilter::new(Some("고래"), Some("school"), None).unwrap();
        assert!(filter.apply(&entries).is_empty());
    }
}
