//! Service configuration.
//!
//! Loaded once at startup from an optional YAML file, then overridden from
//! the environment. The resulting value is passed explicitly to everything
//! that needs it.

use anyhow::{bail, Context, Result};
use graph_store::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Public base URL; every canonical URI is derived from it.
    pub base_url: String,

    /// Title used when the store declares no dataset.
    pub api_title: String,

    /// Markdown description used when the store declares no dataset.
    pub api_description: Option<String>,

    /// Where the features graph lives.
    pub store: StoreConfig,

    /// Request limits.
    pub limits: LimitsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_title: "OGC LD API".to_string(),
            api_description: None,
            store: StoreConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Which [`graph_store::GraphStore`] to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// A SPARQL 1.1 endpoint.
    Sparql,
    /// A YAML or JSON dataset file served from memory.
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// SPARQL query endpoint (`kind: sparql`).
    pub endpoint: Option<String>,

    /// Dataset file (`kind: file`).
    pub dataset_file: Option<PathBuf>,

    /// Timeout for a single store query, in seconds.
    pub query_timeout_secs: u64,

    /// Retry policy for failed queries. No retries by default.
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::File,
            endpoint: None,
            dataset_file: Some(PathBuf::from("data/sample-dataset.yaml")),
            query_timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted `per_page` or `limit`.
    pub max_page_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_page_size: features_protocol::queries::DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Load from `path` (defaults when `None`), apply environment overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Apply `FEATURES_BASE_URL`, `FEATURES_API_TITLE`, `SPARQL_ENDPOINT` and
    /// `FEATURES_DATASET_FILE` from `lookup`.
    ///
    /// An endpoint switches the store to SPARQL; a dataset file switches it
    /// to a file store.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup("FEATURES_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(title) = lookup("FEATURES_API_TITLE") {
            self.api_title = title;
        }
        if let Some(endpoint) = lookup("SPARQL_ENDPOINT") {
            self.store.kind = StoreKind::Sparql;
            self.store.endpoint = Some(endpoint);
        }
        if let Some(file) = lookup("FEATURES_DATASET_FILE") {
            self.store.kind = StoreKind::File;
            self.store.dataset_file = Some(PathBuf::from(file));
        }
    }

    /// Check consistency and normalize the base URL.
    pub fn validate(&mut self) -> Result<()> {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        if url::Url::parse(&self.base_url).is_err() {
            bail!("base_url '{}' is not an absolute URL", self.base_url);
        }
        match self.store.kind {
            StoreKind::Sparql if self.store.endpoint.is_none() => {
                bail!("store.kind is sparql but store.endpoint is not set")
            }
            StoreKind::File if self.store.dataset_file.is_none() => {
                bail!("store.kind is file but store.dataset_file is not set")
            }
            _ => {}
        }
        if self.store.query_timeout_secs == 0 {
            bail!("store.query_timeout_secs must be at least 1");
        }
        if self.limits.max_page_size == 0 {
            bail!("limits.max_page_size must be at least 1");
        }
        Ok(())
    }
}
