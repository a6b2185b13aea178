//! MCP Server for the dream diary
//!
//! Exposes similarity search and entry lookup to MCP clients over stdio.

mod server;

pub use server::run_mcp_server;
