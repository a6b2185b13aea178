use std::collections::HashSet;

use anyhow::{bail, Result};
use colored::*;

use dream_diary::core::entry::find_entry;
use dream_diary::search::related;
use dream_diary::{DiaryEntry, DiaryPaths};

use super::dejavu::ScoredEntryJson;
use super::load_diary;

pub fn run(paths: &DiaryPaths, id: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let (config, entries) = load_diary(paths)?;

    let Some(source) = find_entry(&entries, id) else {
        bail!("Entry '{}' not found", id);
    };

    let mut options = config.search;
    if let Some(limit) = limit {
        options.limit = limit;
    }

    if source.embedding.is_none() {
        return print_shared_tags(source, &entries, options.limit, json);
    }

    let results = related(source, &entries, &options);

    if json {
        let json_results: Vec<ScoredEntryJson> =
            results.iter().map(ScoredEntryJson::from).collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
        return Ok(());
    }

    println!("{}", "Related Dreams".bold());
    println!("{}", "=".repeat(60));
    println!("Source: {}", source.title.cyan());
    println!();

    if results.is_empty() {
        println!("{}", "No related dreams found.".yellow());
        return Ok(());
    }

    let source_tags: HashSet<&str> = source.unique_tags().into_iter().collect();
    for result in &results {
        let shared: Vec<&str> = result
            .entry
            .unique_tags()
            .into_iter()
            .filter(|t| source_tags.contains(t))
            .collect();
        print!(
            "  [{:.1}%] {}",
            result.similarity * 100.0,
            result.entry.title.cyan()
        );
        if shared.is_empty() {
            println!();
        } else {
            println!(" (shared: {})", shared.join(", ").dimmed());
        }
    }

    Ok(())
}

/// Ranking by shared tags, for entries that were never embedded.
fn shared_tag_ranking<'a>(
    source: &DiaryEntry,
    entries: &'a [DiaryEntry],
) -> Vec<(&'a DiaryEntry, Vec<String>)> {
    let source_tags: HashSet<&str> = source.unique_tags().into_iter().collect();

    let mut related: Vec<(&DiaryEntry, Vec<String>)> = entries
        .iter()
        .filter(|e| e.id != source.id)
        .filter_map(|e| {
            let shared: Vec<String> = e
                .unique_tags()
                .into_iter()
                .filter(|t| source_tags.contains(t))
                .map(String::from)
                .collect();
            (!shared.is_empty()).then_some((e, shared))
        })
        .collect();

    related.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    related
}

fn print_shared_tags(
    source: &DiaryEntry,
    entries: &[DiaryEntry],
    limit: usize,
    json: bool,
) -> Result<()> {
    let related = shared_tag_ranking(source, entries);

    if json {
        let json_results: Vec<_> = related
            .iter()
            .take(limit)
            .map(|(entry, shared)| {
                serde_json::json!({
                    "id": entry.id,
                    "title": entry.title,
                    "date": entry.date,
                    "shared_tags": shared,
                    "mode": "tags",
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
        return Ok(());
    }

    println!(
        "{} '{}' has no embedding; ranking by shared tags",
        "!".yellow(),
        source.title
    );
    println!();

    if related.is_empty() {
        println!("{}", "No related dreams found.".yellow());
        return Ok(());
    }

    for (entry, shared) in related.iter().take(limit) {
        println!(
            "  {} ({} shared: {})",
            entry.title.cyan(),
            shared.len(),
            shared.join(", ")
        );
    }

    if related.len() > limit {
        println!();
        println!(
            "{}",
            format!("... and {} more", related.len() - limit).dimmed()
        );
    }

    Ok(())
}
