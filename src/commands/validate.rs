use anyhow::Result;
use colored::*;
use serde::Serialize;

use dream_diary::core::schema::{dominant_dimension, validate_entry};
use dream_diary::{DiaryEntry, DiaryPaths};

use super::load_diary;

#[derive(Serialize)]
struct ValidationResult {
    total_entries: usize,
    searchable_entries: usize,
    embedding_dimension: Option<usize>,
    errors: usize,
    warnings: usize,
    entries_with_issues: Vec<EntryReport>,
}

#[derive(Serialize)]
struct EntryReport {
    entry: String,
    title: String,
    errors: Vec<String>,
    warnings: Vec<String>,
}

pub fn run(paths: &DiaryPaths, json: bool) -> Result<()> {
    let (_, entries) = load_diary(paths)?;
    let result = validate(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    if result.errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn validate(entries: &[DiaryEntry]) -> ValidationResult {
    let dimension = dominant_dimension(entries);

    let mut result = ValidationResult {
        total_entries: entries.len(),
        searchable_entries: entries.iter().filter(|e| e.is_searchable()).count(),
        embedding_dimension: dimension,
        errors: 0,
        warnings: 0,
        entries_with_issues: Vec::new(),
    };

    for (index, entry) in entries.iter().enumerate() {
        let (warnings, errors): (Vec<_>, Vec<_>) = validate_entry(entry, dimension)
            .into_iter()
            .partition(|issue| issue.is_informational());

        if errors.is_empty() && warnings.is_empty() {
            continue;
        }

        result.errors += errors.len();
        result.warnings += warnings.len();
        result.entries_with_issues.push(EntryReport {
            entry: entry.id.clone().unwrap_or_else(|| format!("#{}", index + 1)),
            title: entry.title.clone(),
            errors: errors.iter().map(ToString::to_string).collect(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        });
    }

    result
}

fn print_report(result: &ValidationResult) {
    println!("{}", "Diary Validation Report".bold());
    println!("{}", "=".repeat(60));
    println!();
    println!("Total entries: {}", result.total_entries);
    println!("Searchable entries: {}", result.searchable_entries);
    match result.embedding_dimension {
        Some(dim) => println!("Embedding dimension: {}", dim),
        None => println!("Embedding dimension: {}", "none".dimmed()),
    }
    println!();

    if result.entries_with_issues.is_empty() {
        println!("{}", "✓ No issues found!".green());
        return;
    }

    println!("{}", "Issues:".yellow().bold());
    println!("{}", "-".repeat(60));

    for report in &result.entries_with_issues {
        println!();
        println!("{} {} {}", "ENTRY:".cyan(), report.entry, report.title.dimmed());
        for err in &report.errors {
            println!("  {} {}", "•".red(), err);
        }
        for warning in &report.warnings {
            println!("  {} {}", "•".yellow(), warning);
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  Errors: {}",
        if result.errors > 0 {
            result.errors.to_string().red()
        } else {
            result.errors.to_string().green()
        }
    );
    println!("  Warnings: {}", result.warnings.to_string().yellow());
}
