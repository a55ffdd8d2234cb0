//! Plain records returned by graph store queries.
//!
//! Records carry store URIs; turning them into API entities with canonical
//! URIs is the caller's job.

use features_protocol::{Extent, Geometry};

/// The `dcat:Dataset` the API publishes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetRecord {
    pub uri: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A declared conformance target.
#[derive(Debug, Clone, PartialEq)]
pub struct ConformanceRecord {
    pub uri: String,
    pub title: Option<String>,
}

/// What kind of resource an identifier lookup is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Collection,
    Feature,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Collection => "collection",
            ResourceKind::Feature => "feature",
        }
    }
}

/// A collection or feature as found by identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub uri: String,
    pub identifier: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Store URIs of the owning collections (features only).
    pub is_part_of: Vec<String>,
    /// Declared extent (collections only).
    pub extent: Option<Extent>,
}

impl ResourceRecord {
    pub fn is_member_of(&self, collection_uri: &str) -> bool {
        self.is_part_of.iter().any(|uri| uri == collection_uri)
    }
}

/// Everything needed to build a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub uri: String,
    pub identifier: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_part_of: Vec<String>,
    pub geometries: Vec<Geometry>,
}
