use anyhow::{Context, Result};
use colored::*;
use std::fs;

use dream_diary::core::config::DiaryConfig;
use dream_diary::DiaryPaths;

pub fn run(paths: &DiaryPaths, force: bool) -> Result<()> {
    println!("{}", "Dream Diary Setup".bold());
    println!("{}", "=".repeat(50));
    println!();

    if paths.config.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            "!".yellow().bold(),
            paths.config.display()
        );
    } else {
        let yaml = DiaryConfig::default().to_yaml()?;
        fs::write(&paths.config, yaml)
            .with_context(|| format!("Failed to write {}", paths.config.display()))?;
        println!("{} Wrote {}", "✓".green(), paths.config.display());
    }

    let config = DiaryConfig::load(paths)?;
    let entries_path = paths.entries_path(&config.entries);
    println!();
    if entries_path.exists() {
        println!("{} Snapshot found: {}", "✓".green(), entries_path.display());
    } else {
        println!(
            "{} Snapshot missing: {} (export your diary entries as JSON here)",
            "✗".red(),
            entries_path.display()
        );
    }
    println!("{} Embedding endpoint: {}", "→".dimmed(), config.embedding.endpoint);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_loadable_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = DiaryPaths::from_root(dir.path().to_path_buf());

        run(&paths, false)?;
        assert!(paths.config.exists());
        assert_eq!(DiaryConfig::from_file(&paths.config)?, DiaryConfig::default());

        fs::write(&paths.config, "search:\n  limit: 9\n")?;
        run(&paths, false)?;
        assert_eq!(DiaryConfig::from_file(&paths.config)?.search.limit, 9);

        run(&paths, true)?;
        assert_eq!(DiaryConfig::from_file(&paths.config)?.search.limit, 5);
        Ok(())
    }
}
