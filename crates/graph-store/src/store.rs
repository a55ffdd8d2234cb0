//! The query interface.

use async_trait::async_trait;
use features_protocol::BboxFilter;

use crate::error::QueryError;
use crate::records::{ConformanceRecord, DatasetRecord, FeatureRecord, ResourceKind, ResourceRecord};

/// Read-only access to the features graph.
///
/// All URIs are store URIs. Lists come back in ascending identifier order.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Title and description of the published dataset.
    async fn dataset(&self) -> Result<Option<DatasetRecord>, QueryError>;

    /// Conformance targets declared in the graph.
    async fn conformance_targets(&self) -> Result<Vec<ConformanceRecord>, QueryError>;

    /// Every collection.
    async fn collections(&self) -> Result<Vec<ResourceRecord>, QueryError>;

    /// Every resource of `kind` carrying `identifier`. Feature identifiers
    /// repeat across collections, so several records may come back.
    async fn lookup(
        &self,
        identifier: &str,
        kind: ResourceKind,
    ) -> Result<Vec<ResourceRecord>, QueryError>;

    /// Member feature URIs of a collection, optionally filtered.
    async fn scan(
        &self,
        collection_uri: &str,
        filter: Option<&BboxFilter>,
    ) -> Result<Vec<String>, QueryError>;

    /// Number of features in a collection.
    async fn count(&self, collection_uri: &str) -> Result<usize, QueryError>;

    /// Attributes and geometries of one feature.
    async fn describe(&self, uri: &str) -> Result<Option<FeatureRecord>, QueryError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), QueryError>;
}
