use anyhow::Result;
use chrono::Local;
use colored::*;

use dream_diary::{DiaryPaths, DiaryStats};

use super::{load_diary, pad};

const TOP_N: usize = 10;

pub fn run(paths: &DiaryPaths, json: bool) -> Result<()> {
    let (_, entries) = load_diary(paths)?;
    let stats = DiaryStats::collect(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }

    Ok(())
}

fn print_stats(stats: &DiaryStats) {
    println!("{}", "Dream Diary Stats".bold());
    println!("{}", "=".repeat(50));
    println!();
    println!("Checked at: {}", Local::now().to_rfc3339());
    println!();
    println!("   {} {:>4}", pad("Entries", 12), stats.total_entries);
    println!("   {} {:>4}", pad("Searchable", 12), stats.searchable_entries);
    if let Some((month, count)) = stats.busiest_month() {
        println!("   {} {} ({})", pad("Busiest", 12), month, count);
    }
    println!();

    print_distribution("Emotions", &stats.top_emotions(TOP_N), stats.total_entries);
    print_distribution("Tags", &stats.top_tags(TOP_N), stats.total_entries);

    println!("{}", "Monthly".cyan());
    println!("{}", "-".repeat(30));
    for (month, count) in &stats.monthly_counts {
        println!("   {} {:>4} {}", month, count, "▇".repeat((*count).min(40)).dimmed());
    }
    println!();

    if !stats.recent.is_empty() {
        println!("{}", "Recent".cyan());
        println!("{}", "-".repeat(30));
        for recent in &stats.recent {
            let date = recent.date.as_deref().unwrap_or("no date");
            match recent.emotion.as_deref() {
                Some(emotion) => println!("   {} {} [{}]", date, recent.title, emotion.dimmed()),
                None => println!("   {} {}", date, recent.title),
            }
        }
        println!();
    }

    println!("{}", "=".repeat(50));
}

fn print_distribution(title: &str, dist: &[(&str, usize)], total: usize) {
    if dist.is_empty() {
        return;
    }
    println!("{}", title.cyan());
    println!("{}", "-".repeat(30));
    for (key, count) in dist {
        let pct = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("   {} {:>4} ({:.0}%)", pad(key, 12), count, pct);
    }
    println!();
}
