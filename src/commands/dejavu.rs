//! Dejavu command - find past dreams similar to a description

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use dream_diary::{DiaryConfig, DiaryPaths, ScoredEntry, SearchEngine, SearchError};

use super::truncate;

#[derive(Serialize)]
pub(crate) struct ScoredEntryJson {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub emotion: Option<String>,
    pub similarity: f32,
}

impl From<&ScoredEntry<'_>> for ScoredEntryJson {
    fn from(scored: &ScoredEntry<'_>) -> Self {
        let entry = scored.entry;
        Self {
            id: scored.id().to_string(),
            title: entry.title.clone(),
            date: entry.date.clone(),
            tags: entry.unique_tags().into_iter().map(String::from).collect(),
            emotion: entry.emotion.clone(),
            similarity: scored.similarity,
        }
    }
}

/// Run similarity search command
pub async fn run(
    paths: &DiaryPaths,
    query: &str,
    limit: Option<usize>,
    threshold: Option<f32>,
    json: bool,
) -> Result<()> {
    let config = DiaryConfig::load(paths)?;

    let mut options = config.search;
    if let Some(limit) = limit {
        options.limit = limit;
    }
    if let Some(threshold) = threshold {
        options.threshold = threshold;
    }
    options.validate().context("Invalid --threshold")?;

    if query.trim().is_empty() {
        if json {
            println!("[]");
        } else {
            println!("{} Nothing to search for", "!".yellow());
        }
        return Ok(());
    }

    let entries = config.load_entries(paths)?;
    let engine = SearchEngine::from_config(&config)?.with_options(options);
    let results = results_or_empty(engine.search(query, &entries).await);

    if json {
        let json_results: Vec<ScoredEntryJson> =
            results.iter().map(ScoredEntryJson::from).collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No similar dreams found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} similar dreams for: {}",
        "→".dimmed(),
        results.len(),
        query.trim().cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let score_str = format!("{:.1}%", result.similarity * 100.0);
        let score_colored = if result.similarity > 0.8 {
            score_str.green()
        } else if result.similarity > 0.6 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] {}",
            (i + 1).to_string().bold(),
            score_colored,
            result.entry.title.cyan()
        );

        if !result.entry.content.is_empty() {
            println!("   {}", truncate(&result.entry.content.replace('\n', " "), 100).dimmed());
        }

        let tags = result.entry.unique_tags();
        match (result.entry.date.as_deref(), tags.is_empty()) {
            (Some(date), false) => println!("   {} | #{}", date, tags.join(" #")),
            (Some(date), true) => println!("   {}", date),
            (None, false) => println!("   #{}", tags.join(" #")),
            (None, true) => {}
        }
        println!();
    }

    Ok(())
}

/// A failed similarity search reads as "no similar dreams"; the cause is
/// logged.
pub(crate) fn results_or_empty(
    result: Result<Vec<ScoredEntry<'_>>, SearchError>,
) -> Vec<ScoredEntry<'_>> {
    match result {
        Ok(results) => results,
        Err(SearchError::InvalidQuery) => Vec::new(),
        Err(e @ SearchError::EmbeddingUnavailable(_)) => {
            tracing::warn!(error = %e, "similarity search unavailable");
            Vec::new()
        }
    }
}
