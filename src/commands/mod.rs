pub mod dejavu;
pub mod init;
pub mod related;
pub mod search;
pub mod stats;
pub mod tags;
pub mod validate;

use anyhow::Result;
use unicode_width::UnicodeWidthStr;

use dream_diary::{DiaryConfig, DiaryEntry, DiaryPaths};

/// Config for the diary at `paths` plus every entry of its snapshot.
pub fn load_diary(paths: &DiaryPaths) -> Result<(DiaryConfig, Vec<DiaryEntry>)> {
    let config = DiaryConfig::load(paths)?;
    let entries = config.load_entries(paths)?;
    Ok((config, entries))
}

/// Char-aware truncation for display.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}

/// Left-align `s` to `width` terminal columns (Hangul counts as two).
pub fn pad(s: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(used)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("꿈속에서 날았다", 3), "꿈속에...");
    }

    #[test]
    fn test_pad_wide_chars() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("기쁨", 6), "기쁨  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }
}
