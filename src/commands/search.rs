use anyhow::Result;
use chrono::NaiveDate;
use colored::*;

use dream_diary::core::filter::{EntryFilter, MatchField};
use dream_diary::{DiaryEntry, DiaryPaths};

use super::{load_diary, truncate};

pub fn run(
    paths: &DiaryPaths,
    query: Option<&str>,
    tag: Option<&str>,
    date: Option<NaiveDate>,
    limit: Option<usize>,
) -> Result<()> {
    let (_, entries) = load_diary(paths)?;
    let filter = EntryFilter::new(query, tag, date)?;

    let results: Vec<(&DiaryEntry, String)> = filter
        .apply(&entries)
        .into_iter()
        .map(|entry| (entry, describe_match(&filter, entry)))
        .collect();

    let total = results.len();
    let display_limit = limit.unwrap_or(20);
    let results_to_show = &results[..results.len().min(display_limit)];

    println!("{}", "Search Results".bold());
    println!("{}", "=".repeat(60));
    if let Some(q) = query {
        println!("Query: \"{}\"", q);
    }
    if let Some(t) = tag {
        println!("Tag: #{}", t);
    }
    if let Some(d) = date {
        println!("Date: {}", d);
    }
    println!("Found: {} entries", total);
    println!();

    if results_to_show.is_empty() {
        println!("{}", "No matches found.".yellow());
    } else {
        for (entry, context) in results_to_show {
            println!(
                "{} [{}]",
                entry.title.cyan(),
                entry.date.as_deref().unwrap_or("no date")
            );
            if !context.is_empty() {
                println!("  {}", context.dimmed());
            }
            let tags = entry.unique_tags();
            if !tags.is_empty() {
                let tags: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
                println!("  {}", tags.join(" "));
            }
            println!();
        }

        if total > display_limit {
            println!(
                "{}",
                format!("... and {} more results", total - display_limit).dimmed()
            );
        }
    }

    Ok(())
}

fn describe_match(filter: &EntryFilter, entry: &DiaryEntry) -> String {
    match filter.text_match(entry) {
        Some(MatchField::Title) => format!("Title: {}", truncate(&entry.title, 80)),
        Some(MatchField::Tag(tag)) => format!("Tag: #{}", tag),
        Some(MatchField::Content { start, end }) => format!(
            "Content: ...{}...",
            extract_context(&entry.content, start, end, 30).replace('\n', " ")
        ),
        None => truncate(&entry.content.replace('\n', " "), 80),
    }
}

fn extract_context(
    content: &str,
    match_start: usize,
    match_end: usize,
    context_chars: usize,
) -> String {
    let chars: Vec<char> = content.chars().collect();
    let byte_to_char: std::collections::HashMap<usize, usize> = content
        .char_indices()
        .enumerate()
        .map(|(i, (byte_idx, _))| (byte_idx, i))
        .collect();

    let char_start = byte_to_char.get(&match_start).copied().unwrap_or(0);
    let char_end = byte_to_char.get(&match_end).copied().unwrap_or(chars.len());

    let start = char_start.saturating_sub(context_chars);
    let end = (char_end + context_chars).min(chars.len());

    chars[start..end].iter().collect()
}
