//! dream-diary library
//!
//! Dream diary tooling over an exported entry snapshot.
//!
//! # Modules
//!
//! - `core`: Entries, configuration, filtering, statistics, validation
//! - `search`: Embedding-based dream similarity search

pub mod core;
pub mod search;

// Re-exports for convenience
pub use core::config::DiaryConfig;
pub use core::entry::{load_entries, DiaryEntry};
pub use core::filter::EntryFilter;
pub use core::paths::DiaryPaths;
pub use core::schema::{validate_entry, EntryIssue};
pub use core::stats::DiaryStats;
pub use search::{ScoredEntry, SearchEngine, SearchError, SearchOptions};
