pub mod config;
pub mod entry;
pub mod filter;
pub mod paths;
pub mod schema;
pub mod stats;
