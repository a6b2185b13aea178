use std::collections::BTreeMap;

use anyhow::Result;
use colored::*;
use serde::Serialize;

use dream_diary::{DiaryEntry, DiaryPaths};

use super::{load_diary, pad};

const LOW_USAGE: usize = 2;

#[derive(Serialize)]
struct TagsResult {
    total_entries: usize,
    total_tags: usize,
    unique_tags: usize,
    entries_without_tags: usize,
    tag_usage: Vec<TagUsage>,
    low_usage_tags: Vec<String>,
    suggestions: Vec<Suggestion>,
}

#[derive(Serialize)]
struct TagUsage {
    tag: String,
    count: usize,
    entries: Vec<String>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
enum Action {
    Merge,
    Review,
}

#[derive(Serialize)]
struct Suggestion {
    action: Action,
    tag: String,
    reason: String,
}

pub fn run(paths: &DiaryPaths, analyze: bool, json: bool) -> Result<()> {
    let (_, entries) = load_diary(paths)?;
    let result = analyze_tags(&entries, analyze);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result, analyze);
    }

    Ok(())
}

fn analyze_tags(entries: &[DiaryEntry], analyze: bool) -> TagsResult {
    let mut tag_entries: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut entries_without_tags = 0;
    let mut total_tags = 0;

    for entry in entries {
        let tags = entry.unique_tags();
        if tags.is_empty() {
            entries_without_tags += 1;
        }
        total_tags += tags.len();

        for tag in tags {
            tag_entries.entry(tag).or_default().push(entry.title.clone());
        }
    }

    let mut tag_usage: Vec<TagUsage> = tag_entries
        .into_iter()
        .map(|(tag, entries)| TagUsage {
            tag: tag.to_string(),
            count: entries.len(),
            entries,
        })
        .collect();

    tag_usage.sort_by(|a, b| b.count.cmp(&a.count));

    let low_usage_tags: Vec<String> = tag_usage
        .iter()
        .filter(|t| t.count <= LOW_USAGE)
        .map(|t| t.tag.clone())
        .collect();

    let suggestions = if analyze {
        suggest(&tag_usage)
    } else {
        Vec::new()
    };

    TagsResult {
        total_entries: entries.len(),
        total_tags,
        unique_tags: tag_usage.len(),
        entries_without_tags,
        tag_usage,
        low_usage_tags,
        suggestions,
    }
}

fn suggest(tag_usage: &[TagUsage]) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    // Prefix pairs like "fly" / "flying" are usually the same tag
    for (i, a) in tag_usage.iter().enumerate() {
        for b in &tag_usage[i + 1..] {
            let a_lower = a.tag.to_lowercase();
            let b_lower = b.tag.to_lowercase();
            if a_lower.starts_with(&b_lower) || b_lower.starts_with(&a_lower) {
                suggestions.push(Suggestion {
                    action: Action::Merge,
                    tag: format!("{} / {}", a.tag, b.tag),
                    reason: "Similar tag names - consider merging".to_string(),
                });
            }
        }
    }

    for usage in tag_usage.iter().filter(|t| t.count == 1) {
        suggestions.push(Suggestion {
            action: Action::Review,
            tag: usage.tag.clone(),
            reason: format!("Used only once in: {}", usage.entries.join(", ")),
        });
    }

    suggestions
}

fn print_report(result: &TagsResult, analyze: bool) {
    println!("{}", "Dream Tag Analysis".bold());
    println!("{}", "=".repeat(60));
    println!();
    println!("Total entries: {}", result.total_entries);
    println!("Entries without tags: {}", result.entries_without_tags);
    println!("Total tag usages: {}", result.total_tags);
    println!("Unique tags: {}", result.unique_tags);
    println!("Low usage tags (≤{}): {}", LOW_USAGE, result.low_usage_tags.len());
    println!();

    println!("{}", "Tag Usage (sorted by count):".cyan().bold());
    println!("{}", "-".repeat(60));

    let width = result
        .tag_usage
        .iter()
        .map(|u| unicode_width::UnicodeWidthStr::width(u.tag.as_str()))
        .max()
        .unwrap_or(0);

    for usage in &result.tag_usage {
        let count_str = format!("{:>3}", usage.count);
        let count_colored = if usage.count >= 5 {
            count_str.green()
        } else if usage.count >= 2 {
            count_str.yellow()
        } else {
            count_str.red()
        };
        println!("  {} × {}", pad(&usage.tag, width), count_colored);
    }

    if analyze && !result.suggestions.is_empty() {
        println!();
        println!("{}", "Suggestions:".yellow().bold());
        println!("{}", "-".repeat(60));

        for suggestion in &result.suggestions {
            let action = match suggestion.action {
                Action::Merge => "MERGE".cyan(),
                Action::Review => "REVIEW".yellow(),
            };
            println!("  {} [{}]", action, suggestion.tag);
            println!("     {}", suggestion.reason);
        }
    }

    println!();
    println!("{}", "=".repeat(60));

    if result.low_usage_tags.len() > result.unique_tags / 2 {
        println!(
            "{}",
            "Warning: Many low-usage tags detected. Consider cleanup.".yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(title: &str, tags: &[&str]) -> DiaryEntry {
        DiaryEntry {
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_analyze_tags() {
        let entries = vec![
            tagged("a", &["fly", "sea", "fly"]),
            tagged("b", &["flying", "sea"]),
            tagged("c", &["sea"]),
            tagged("d", &[]),
        ];

        let result = analyze_tags(&entries, true);
        assert_eq!(result.total_entries, 4);
        assert_eq!(result.entries_without_tags, 1);
        // duplicate "fly" in entry a counts once
        assert_eq!(result.total_tags, 5);
        assert_eq!(result.unique_tags, 3);
        assert_eq!(result.tag_usage[0].tag, "sea");
        assert_eq!(result.tag_usage[0].count, 3);
        assert_eq!(result.low_usage_tags, vec!["fly", "flying"]);

        let merges: Vec<_> = result
            .suggestions
            .iter()
            .filter(|s| s.action == Action::Merge)
            .map(|s| s.tag.as_str())
            .collect();
        assert_eq!(merges, vec!["fly / flying"]);
        assert_eq!(
            result
                .suggestions
                .iter()
                .filter(|s| s.action == Action::Review)
                .count(),
            2
        );
    }

    #[test]
    fn test_no_suggestions_without_analyze() {
        let entries = vec![tagged("a", &["one"])];
        assert!(analyze_tags(&entries, false).suggestions.is_empty());
    }
}
