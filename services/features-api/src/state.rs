//! Application state for the features API.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use graph_store::{GraphStore, MemoryStore, SparqlStore};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::{ServiceConfig, StoreKind};
use crate::query::QueryEngine;
use crate::render::{BasicHtml, HtmlTemplates, Renderers};
use crate::resources::Resources;

/// Shared application state. Read-only after startup.
pub struct AppState {
    pub config: ServiceConfig,

    /// Loads entities from the graph store.
    pub engine: QueryEngine,

    /// Profiles and allowed parameters per resource.
    pub resources: Resources,

    /// Validated render tables.
    pub renderers: Renderers,

    /// HTML page renderer.
    pub html: Arc<dyn HtmlTemplates>,

    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state with the store named by the configuration.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let store = build_store(&config)?;
        Self::with_store(config, store)
    }

    /// Build state around an existing store.
    ///
    /// Fails when a render table does not cover every declared profile and
    /// media type.
    pub fn with_store(config: ServiceConfig, store: Arc<dyn GraphStore>) -> Result<Self> {
        let resources = Resources::new();
        let renderers = Renderers::new();
        renderers
            .validate(&resources)
            .context("Render table validation failed")?;

        Ok(Self {
            engine: QueryEngine::new(store, &config),
            config,
            resources,
            renderers,
            html: Arc::new(BasicHtml),
            metrics: None,
        })
    }

    pub fn with_html(mut self, html: Arc<dyn HtmlTemplates>) -> Self {
        self.html = html;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Connect to the configured graph store.
pub fn build_store(config: &ServiceConfig) -> Result<Arc<dyn GraphStore>> {
    let store = &config.store;
    match store.kind {
        StoreKind::Sparql => {
            let endpoint = store
                .endpoint
                .clone()
                .context("store.endpoint is required for a SPARQL store")?;
            info!(endpoint = %endpoint, timeout_secs = store.query_timeout_secs, "Using SPARQL store");
            let sparql = SparqlStore::new(endpoint, store.query_timeout(), store.retry)
                .context("Failed to create SPARQL client")?;
            Ok(Arc::new(sparql))
        }
        StoreKind::File => {
            let path = store
                .dataset_file
                .as_ref()
                .context("store.dataset_file is required for a file store")?;
            info!(path = %path.display(), "Loading dataset file");
            let memory = MemoryStore::from_file(path)
                .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
            Ok(Arc::new(memory))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::write_sample_dataset;

    #[test]
    fn test_state_from_dataset_file() {
        let (_dir, path) = write_sample_dataset();
        let mut config = ServiceConfig::default();
        config.store.dataset_file = Some(path);
        let state = AppState::new(config).unwrap();
        assert_eq!(state.engine.store_name(), "memory");
        assert!(state.metrics.is_none());
    }

    #[test]
    fn test_missing_dataset_file_fails() {
        let mut config = ServiceConfig::default();
        config.store.dataset_file = Some("/nonexistent/dataset.yaml".into());
        let err = AppState::new(config).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/dataset.yaml"));
    }

    #[test]
    fn test_sparql_store_needs_endpoint() {
        let mut config = ServiceConfig::default();
        config.store.kind = StoreKind::Sparql;
        assert!(build_store(&config).is_err());
    }
}
