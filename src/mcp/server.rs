//! Dream Diary MCP Server implementation

use anyhow::Result;
use chrono::NaiveDate;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use dream_diary::core::entry::find_entry;
use dream_diary::search::related;
use dream_diary::{DiaryConfig, DiaryEntry, DiaryPaths, DiaryStats, EntryFilter, SearchEngine};

use crate::commands::dejavu::{results_or_empty, ScoredEntryJson};

const SEARCH_MAX: usize = 50;
const LIST_MAX: usize = 500;

/// Parameters for diary_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Free-text description of a dream (e.g., "falling from a tall building")
    #[schemars(description = "Free-text description of the dream to look for")]
    pub query: String,
    #[schemars(description = "Maximum number of results (default: 5)")]
    #[serde(default)]
    pub limit: Option<usize>,
    #[schemars(description = "Minimum cosine similarity, exclusive (default: 0.3)")]
    #[serde(default)]
    pub threshold: Option<f32>,
}

/// Parameters for diary_get_entry / diary_related tools
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntryParams {
    #[schemars(description = "Entry id")]
    pub id: String,
    #[schemars(description = "Maximum number of related entries (diary_related only)")]
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for diary_list_entries tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEntriesParams {
    #[schemars(description = "Case-insensitive text in title, content or tags")]
    #[serde(default)]
    pub text: Option<String>,
    #[schemars(description = "Exact tag")]
    #[serde(default)]
    pub tag: Option<String>,
    #[schemars(description = "Calendar day, YYYY-MM-DD")]
    #[serde(default)]
    pub date: Option<String>,
    #[schemars(description = "Maximum results (default: 50)")]
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    50
}

/// Entry view for JSON output; never carries the embedding
#[derive(Debug, Serialize)]
struct EntryInfoJson<'a> {
    id: Option<&'a str>,
    title: &'a str,
    date: Option<&'a str>,
    tags: Vec<&'a str>,
    emotion: Option<&'a str>,
    keywords: &'a [String],
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    has_embedding: bool,
}

impl<'a> EntryInfoJson<'a> {
    fn new(entry: &'a DiaryEntry, with_content: bool) -> Self {
        Self {
            id: entry.id.as_deref(),
            title: &entry.title,
            date: entry.date.as_deref(),
            tags: entry.unique_tags(),
            emotion: entry.emotion.as_deref(),
            keywords: &entry.keywords,
            summary: entry.summary.as_deref(),
            content: with_content.then_some(entry.content.as_str()),
            has_embedding: entry.embedding.is_some(),
        }
    }
}

/// Requested limit, 0 meaning "use the default", capped at `max`
fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    match requested {
        None | Some(0) => default.clamp(1, max),
        Some(n) => n.min(max),
    }
}

fn json_output<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let output = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(output)]))
}

/// Dream Diary MCP Service
#[derive(Clone)]
pub struct DiaryService {
    paths: DiaryPaths,
    tool_router: ToolRouter<Self>,
}

impl DiaryService {
    pub fn new(root: PathBuf) -> Self {
        Self {
            paths: DiaryPaths::from_root(root),
            tool_router: Self::tool_router(),
        }
    }

    /// Snapshot is re-read on every call so edits show up without restart
    fn load(&self) -> Result<(DiaryConfig, Vec<DiaryEntry>), McpError> {
        let config = DiaryConfig::load(&self.paths).map_err(|e| {
            McpError::internal_error(format!("Failed to load config: {:#}", e), None)
        })?;
        let entries = config.load_entries(&self.paths).map_err(|e| {
            McpError::internal_error(format!("Failed to load entries: {:#}", e), None)
        })?;
        Ok((config, entries))
    }
}

#[tool_router]
impl DiaryService {
    /// Find past dreams similar to a description
    #[tool(description = "Find past dream diary entries similar in meaning to a free-text \
        description. Results are ordered by cosine similarity, highest first.")]
    async fn diary_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let (config, entries) = self.load()?;
        let params = params.0;

        let mut options = config.search;
        options.limit = clamp_limit(params.limit, options.limit, SEARCH_MAX);
        if let Some(threshold) = params.threshold {
            options.threshold = threshold;
        }
        options
            .validate()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let engine = SearchEngine::from_config(&config)
            .map_err(|e| McpError::internal_error(format!("Failed to create engine: {}", e), None))?
            .with_options(options);

        let results = results_or_empty(engine.search(&params.query, &entries).await);

        let json_results: Vec<ScoredEntryJson> =
            results.iter().map(ScoredEntryJson::from).collect();
        json_output(&json_results)
    }

    /// Get a single entry with its full content
    #[tool(description = "Get the full content and metadata of a dream diary entry by id.")]
    async fn diary_get_entry(
        &self,
        params: Parameters<EntryParams>,
    ) -> Result<CallToolResult, McpError> {
        let (_, entries) = self.load()?;

        match find_entry(&entries, &params.0.id) {
            Some(entry) => json_output(&EntryInfoJson::new(entry, true)),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                "Entry not found: {}",
                params.0.id
            ))])),
        }
    }

    /// List entries with optional text/tag/date filters
    #[tool(description = "List dream diary entries, optionally filtered by text, exact tag, \
        or calendar day (YYYY-MM-DD).")]
    async fn diary_list_entries(
        &self,
        params: Parameters<ListEntriesParams>,
    ) -> Result<CallToolResult, McpError> {
        let (_, entries) = self.load()?;
        let params = params.0;
        let limit = clamp_limit(Some(params.limit), default_list_limit(), LIST_MAX);

        let date = params
            .date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| McpError::invalid_params(format!("Invalid date: {}", e), None))?;

        let filter = EntryFilter::new(params.text.as_deref(), params.tag.as_deref(), date)
            .map_err(|e| McpError::invalid_params(format!("Invalid filter: {}", e), None))?;

        let listed: Vec<EntryInfoJson> = filter
            .apply(&entries)
            .into_iter()
            .take(limit)
            .map(|e| EntryInfoJson::new(e, false))
            .collect();

        json_output(&listed)
    }

    /// Entries closest to a stored entry's embedding
    #[tool(description = "Find dream diary entries related to an existing entry, using its \
        stored embedding. No embedding service call is made.")]
    async fn diary_related(
        &self,
        params: Parameters<EntryParams>,
    ) -> Result<CallToolResult, McpError> {
        let (config, entries) = self.load()?;
        let params = params.0;

        let Some(source) = find_entry(&entries, &params.id) else {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "Entry not found: {}",
                params.id
            ))]));
        };

        let mut options = config.search;
        options.limit = clamp_limit(params.limit, options.limit, SEARCH_MAX);

        let results: Vec<ScoredEntryJson> = related(source, &entries, &options)
            .iter()
            .map(ScoredEntryJson::from)
            .collect();
        json_output(&results)
    }

    /// Emotion, tag and monthly statistics
    #[tool(description = "Get dream diary statistics: emotion counts, tag counts, entries \
        per month and the most recent entries.")]
    async fn diary_stats(&self) -> Result<CallToolResult, McpError> {
        let (_, entries) = self.load()?;
        json_output(&DiaryStats::collect(&entries))
    }
}

#[tool_handler]
impl ServerHandler for DiaryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Dream Diary MCP Server. Provides similarity search and entry access \
                 over a dream diary snapshot."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server
pub async fn run_mcp_server(root: PathBuf) -> Result<()> {
    use tokio::io::{stdin, stdout};

    let service = DiaryService::new(root);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
