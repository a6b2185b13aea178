mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dream_diary::DiaryPaths;

#[derive(Parser)]
#[command(name = "dream")]
#[command(about = "Dream diary tools with embedding-based dejavu search", long_about = None)]
#[command(version)]
struct Cli {
    /// Diary directory (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    diary: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Debug logging")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Errors only", conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ===== Core Commands =====
    /// Write .dream-diary.yaml and check the snapshot
    Init {
        #[arg(long, help = "Overwrite an existing config")]
        force: bool,
    },
    /// Check entries for missing fields and embedding problems
    Validate {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Filter entries by text, tag and day
    Search {
        query: Option<String>,
        #[arg(long, help = "Exact tag")]
        tag: Option<String>,
        #[arg(long, help = "Calendar day (YYYY-MM-DD)")]
        date: Option<NaiveDate>,
        #[arg(long, help = "Limit results")]
        limit: Option<usize>,
    },
    /// Entries related to an existing entry
    Related {
        id: String,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    Tags {
        #[arg(short, long, help = "Analyze tags and suggest improvements")]
        analyze: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Emotion, tag and monthly statistics
    Stats {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== Similarity Search =====
    /// Find past dreams similar to a description
    #[command(alias = "semantic-search", alias = "ss")]
    Dejavu {
        query: String,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, short, help = "Minimum similarity (exclusive)")]
        threshold: Option<f32>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server for Claude integration
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show Claude configuration instructions")]
        install: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let paths = DiaryPaths::resolve(cli.diary.as_deref());

    match cli.command {
        // Core commands
        Commands::Init { force } => commands::init::run(&paths, force),
        Commands::Validate { json } => commands::validate::run(&paths, json),
        Commands::Search {
            query,
            tag,
            date,
            limit,
        } => commands::search::run(&paths, query.as_deref(), tag.as_deref(), date, limit),
        Commands::Related { id, limit, json } => commands::related::run(&paths, &id, limit, json),
        Commands::Tags { analyze, json } => commands::tags::run(&paths, analyze, json),
        Commands::Stats { json } => commands::stats::run(&paths, json),

        // Similarity search
        Commands::Dejavu {
            query,
            limit,
            threshold,
            json,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::dejavu::run(&paths, &query, limit, threshold, json))
        }

        // MCP Server
        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions(&paths);
                Ok(())
            } else {
                let runtime = tokio::runtime::Runtime::new()?;
                runtime.block_on(mcp::run_mcp_server(paths.root))
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions(paths: &DiaryPaths) {
    use colored::Colorize;

    let diary_path = paths.root.to_string_lossy();
    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "dream".to_string());

    let snippet = format!(
        r#"{{
  "mcpServers": {{
    "dream-diary": {{
      "command": "{}",
      "args": ["mcp", "--diary", "{}"]
    }}
  }}
}}"#,
        binary_path, diary_path
    );

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your Claude configuration:");
    println!();
    println!("{}", "For Claude Desktop (~/.config/claude/claude_desktop_config.json):".dimmed());
    println!("{}", snippet);
    println!();
    println!("{}", "For Claude Code (~/.claude/settings.json):".dimmed());
    println!("{}", snippet);
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Find past dreams similar to a description", "diary_search".green());
    println!("  • {} - Get full entry content", "diary_get_entry".green());
    println!("  • {} - List entries with filters", "diary_list_entries".green());
    println!("  • {} - Entries related to an existing entry", "diary_related".green());
    println!("  • {} - Emotion, tag and monthly statistics", "diary_stats".green());
}
