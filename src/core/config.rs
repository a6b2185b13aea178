//! Diary configuration loaded from `.dream-diary.yaml`.
//!
//! Every section is optional. A missing file yields the defaults.
//!
//! ```yaml
//! entries: dreams.json
//! embedding:
//!   endpoint: http://127.0.0.1:8787/
//!   timeout_secs: 30
//! search:
//!   threshold: 0.3
//!   limit: 5
//!   tie_break: input_order
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::entry::{load_entries, DiaryEntry};
use super::paths::{DiaryPaths, DEFAULT_ENTRIES_FILE};
use crate::search::ranking::SearchOptions;

pub const ENV_EMBEDDING_URL: &str = "DREAM_DIARY_EMBEDDING_URL";
pub const ENV_ENTRIES: &str = "DREAM_DIARY_ENTRIES";

pub const DEFAULT_EMBEDDING_ENDPOINT: &str = "http://127.0.0.1:8787/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiaryConfig {
    /// Snapshot file holding the diary entries.
    pub entries: PathBuf,
    pub embedding: EmbeddingConfig,
    pub search: SearchOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            entries: PathBuf::from(DEFAULT_ENTRIES_FILE),
            embedding: EmbeddingConfig::default(),
            search: SearchOptions::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EMBEDDING_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DiaryConfig {
    /// Read the config file (if any), then apply environment overrides.
    pub fn load(paths: &DiaryPaths) -> Result<Self> {
        let mut config = Self::from_file(&paths.config)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_EMBEDDING_URL).filter(|v| !v.trim().is_empty()) {
            self.embedding.endpoint = url;
        }
        if let Some(entries) = lookup(ENV_ENTRIES).filter(|v| !v.trim().is_empty()) {
            self.entries = PathBuf::from(entries);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Err(e) = self.search.validate() {
            bail!("search.{}", e);
        }
        if self.embedding.timeout_secs == 0 {
            bail!("embedding.timeout_secs must be greater than 0");
        }
        if self.embedding.endpoint.trim().is_empty() {
            bail!("embedding.endpoint must not be empty");
        }
        Ok(())
    }

    pub fn load_entries(&self, paths: &DiaryPaths) -> Result<Vec<DiaryEntry>> {
        load_entries(&paths.entries_path(&self.entries))
    }
}
