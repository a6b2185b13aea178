use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single dream diary entry as exported from the document store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    /// Calendar day the dream happened, usually `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<Timestamp>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
    #[serde(default, alias = "embeddingVector", skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Creation/update time, either RFC 3339 or the document-store export shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Rfc3339(DateTime<Utc>),
    /// Client exports write `seconds`, Admin SDK exports `_seconds`.
    Firestore {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(alias = "_nanoseconds")]
        nanoseconds: u32,
    },
}

impl Timestamp {
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Rfc3339(dt) => Some(dt),
            Self::Firestore {
                seconds,
                nanoseconds,
            } => Utc.timestamp_opt(seconds, nanoseconds).single(),
        }
    }
}

/// Timestamps are informational only; an unknown shape reads as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl DiaryEntry {
    /// Entries take part in similarity search only when they can be keyed
    /// and already carry an embedding.
    pub fn is_searchable(&self) -> bool {
        self.has_id() && self.embedding.is_some()
    }

    /// A blank id cannot key an entry.
    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }

    pub fn id_or_placeholder(&self) -> &str {
        self.id.as_deref().unwrap_or("<no id>")
    }

    pub fn unique_tags(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.as_str();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        seen
    }

    pub fn day(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc).date_naive())
            })
    }

    pub fn month_key(&self) -> Option<String> {
        self.day().map(|d| d.format("%Y-%m").to_string())
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.and_then(Timestamp::to_datetime)
    }

    pub fn embedding_dim(&self) -> Option<usize> {
        self.embedding.as_ref().map(Vec::len)
    }
}

/// Load every entry from a JSON snapshot, preserving file order.
///
/// Accepts a bare array of entries or a backup envelope with a `dreams`
/// array.
pub fn load_entries(path: &Path) -> Result<Vec<DiaryEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read diary snapshot {}", path.display()))?;
    parse_entries(&raw).with_context(|| format!("Invalid diary snapshot {}", path.display()))
}

pub fn parse_entries(raw: &str) -> Result<Vec<DiaryEntry>> {
    let snapshot: Value = serde_json::from_str(raw)?;
    let items = match snapshot {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("dreams") {
            Some(Value::Array(items)) => items,
            _ => bail!("Backup envelope has no `dreams` array"),
        },
        _ => bail!("Expected an array of entries or an object with a `dreams` array"),
    };

    let entries = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let id = item.get("id").and_then(Value::as_str).map(String::from);
            serde_json::from_value::<DiaryEntry>(item).with_context(|| match id {
                Some(id) => format!("Invalid entry #{} (id '{}')", index + 1, id),
                None => format!("Invalid entry #{}", index + 1),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(count = entries.len(), "loaded diary entries");
    Ok(entries)
}

pub fn find_entry<'a>(entries: &'a [DiaryEntry], id: &str) -> Option<&'a DiaryEntry> {
    entries.iter().find(|e| e.id.as_deref() == Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_bare_array() -> Result<()> {
        let raw = r#"[
            {"id": "a", "title": "Flying", "content": "over the sea", "tags": ["sky"],
             "date": "2024-03-02", "embedding": [0.1, 0.2]},
            {"id": "b", "title": "Falling", "content": "", "tags": []}
        ]"#;
        let entries = parse_entries(raw)?;
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_searchable());
        assert!(!entries[1].is_searchable());
        assert_eq!(entries[0].embedding_dim(), Some(2));
        Ok(())
    }

    #[test]
    fn test_parse_backup_envelope_and_alias() -> Result<()> {
        let raw = r#"{
            "dreams": [{"id": "x", "title": "t", "embeddingVector": [1.0, 0.0],
                        "createdAt": {"seconds": 1704067200, "nanoseconds": 0}}],
            "timestamp": "2024-01-01T00:00:00Z",
            "version": "1.0.0",
            "userId": "u1"
        }"#;
        let entries = parse_entries(raw)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].embedding.as_deref(), Some(&[1.0, 0.0][..]));
        let created = entries[0].created().unwrap();
        assert_eq!(created.timestamp(), 1704067200);
        Ok(())
    }

    #[test]
    fn test_admin_export_timestamp() -> Result<()> {
        let raw = r#"[
            {"id": "a", "title": "One"},
            {"id": "b", "title": "Two",
             "createdAt": {"_seconds": 1704067200, "_nanoseconds": 0}}
        ]"#;
        let entries = parse_entries(raw)?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].created().unwrap().timestamp(), 1704067200);
        Ok(())
    }

    #[test]
    fn test_unknown_timestamp_shape_reads_as_absent() -> Result<()> {
        let raw = r#"[
            {"id": "a", "createdAt": 1704067200, "updatedAt": {"when": "today"}},
            {"id": "b", "createdAt": null, "embedding": [1.0, 0.0]}
        ]"#;
        let entries = parse_entries(raw)?;
        assert!(entries[0].created_at.is_none());
        assert!(entries[0].updated_at.is_none());
        assert!(entries[1].created_at.is_none());
        assert!(entries[1].is_searchable());
        Ok(())
    }

    #[test]
    fn test_null_lists_read_as_empty() -> Result<()> {
        let raw = r#"[{"id": "a", "tags": null, "keywords": null, "embedding": [0.5, 0.5]}]"#;
        let entries = parse_entries(raw)?;
        assert!(entries[0].tags.is_empty());
        assert!(entries[0].keywords.is_empty());
        assert!(entries[0].is_searchable());
        Ok(())
    }

    #[test]
    fn test_invalid_entry_is_named() {
        let raw = r#"[{"id": "a", "title": "ok"}, {"id": "b", "title": 5}]"#;
        let err = format!("{:#}", parse_entries(raw).unwrap_err());
        assert!(err.contains("Invalid entry #2 (id 'b')"), "{}", err);

        let raw = r#"[{"title": ["nested"]}]"#;
        let err = format!("{:#}", parse_entries(raw).unwrap_err());
        assert!(err.contains("Invalid entry #1"), "{}", err);
    }

    #[test]
    fn test_unrecognized_snapshot_shape() {
        assert!(parse_entries(r#"{"entries": []}"#).is_err());
        assert!(parse_entries(r#""dreams""#).is_err());
        assert!(parse_entries("[]").unwrap().is_empty());
    }

    #[test]
    fn test_blank_id_is_not_searchable() {
        let mut entry = DiaryEntry {
            id: Some("   ".to_string()),
            embedding: Some(vec![1.0, 0.0]),
            ..Default::default()
        };
        assert!(!entry.has_id());
        assert!(!entry.is_searchable());

        entry.id = Some("d1".to_string());
        assert!(entry.is_searchable());
    }

    #[test]
    fn test_rfc3339_timestamp() -> Result<()> {
        let raw = r#"[{"id": "x", "createdAt": "2024-05-01T10:00:00Z"}]"#;
        let entries = parse_entries(raw)?;
        assert_eq!(entries[0].created().unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
        Ok(())
    }

    #[test]
    fn test_day_and_month_key() {
        let mut entry = DiaryEntry {
            date: Some("2024-03-02".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.month_key().as_deref(), Some("2024-03"));

        entry.date = Some("2024-03-31T23:30:00-02:00".to_string());
        assert_eq!(entry.month_key().as_deref(), Some("2024-04"));

        entry.date = Some("yesterday".to_string());
        assert!(entry.day().is_none());
    }

    #[test]
    fn test_unique_tags() {
        let entry = DiaryEntry {
            tags: vec![
                "water".to_string(),
                "".to_string(),
                "flying".to_string(),
                "water".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(entry.unique_tags(), vec!["water", "flying"]);
    }

    #[test]
    fn test_load_entries_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"[{{"id": "1", "title": "꿈"}}]"#)?;
        let entries = load_entries(file.path())?;
        assert_eq!(entries[0].title, "꿈");
        assert!(find_entry(&entries, "1").is_some());
        assert!(find_entry(&entries, "2").is_none());
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = load_entries(Path::new("/nonexistent/dreams.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read diary snapshot"));
    }
}
