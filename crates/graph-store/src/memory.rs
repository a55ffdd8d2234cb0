//! In-process graph store loaded from a dataset file.
//!
//! Used for local development, demos and tests. Filtering follows the same
//! rules as the SPARQL queries: geometric intersection against WGS84
//! geometries and substring containment against DGGS cell lists.

use async_trait::async_trait;
use features_protocol::{BboxFilter, Crs, Extent, Geometry, GeometryRole};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::QueryError;
use crate::records::{ConformanceRecord, DatasetRecord, FeatureRecord, ResourceKind, ResourceRecord};
use crate::store::GraphStore;

/// On-disk dataset layout (YAML or JSON).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetFile {
    #[serde(default)]
    pub dataset: Option<DatasetEntry>,
    #[serde(default)]
    pub conformance: Vec<ConformanceEntry>,
    #[serde(default)]
    pub collections: Vec<CollectionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceEntry {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extent: Option<Extent>,
    #[serde(default)]
    pub features: Vec<FeatureEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub id: String,
    /// Defaults to `{collection uri}/{id}`.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub geometries: Vec<GeometryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryEntry {
    #[serde(default)]
    pub crs: CrsEntry,
    /// Role token or IRI; unknown roles read as `detailed`.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub coordinates: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CrsEntry {
    #[default]
    Wgs84,
    Dggs,
}

impl From<GeometryEntry> for Geometry {
    fn from(entry: GeometryEntry) -> Self {
        let crs = match entry.crs {
            CrsEntry::Wgs84 => Crs::Wgs84,
            CrsEntry::Dggs => Crs::Dggs,
        };
        let role = entry
            .role
            .as_deref()
            .and_then(GeometryRole::parse)
            .unwrap_or_default();
        Geometry {
            coordinates: entry.coordinates,
            role,
            label: entry.label,
            crs,
        }
    }
}

/// A [`GraphStore`] over a dataset held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    dataset: Option<DatasetRecord>,
    conformance: Vec<ConformanceRecord>,
    /// Sorted by identifier.
    collections: Vec<ResourceRecord>,
    /// Sorted by identifier within each collection.
    members: HashMap<String, Vec<FeatureRecord>>,
}

impl MemoryStore {
    /// Load a dataset file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Dataset(format!("{}: {}", path.display(), e)))?;

        let file: DatasetFile = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| QueryError::Dataset(format!("{}: {}", path.display(), e)))?
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| QueryError::Dataset(format!("{}: {}", path.display(), e)))?
        };

        let store = Self::from_dataset(file);
        info!(
            path = %path.display(),
            collections = store.collections.len(),
            features = store.members.values().map(Vec::len).sum::<usize>(),
            "Loaded dataset file"
        );
        Ok(store)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, QueryError> {
        let file: DatasetFile =
            serde_yaml::from_str(yaml).map_err(|e| QueryError::Dataset(e.to_string()))?;
        Ok(Self::from_dataset(file))
    }

    pub fn from_dataset(file: DatasetFile) -> Self {
        let dataset = file.dataset.map(|d| DatasetRecord {
            uri: d.uri,
            title: d.title,
            description: d.description,
        });
        let conformance = file
            .conformance
            .into_iter()
            .map(|c| ConformanceRecord {
                uri: c.uri,
                title: c.title,
            })
            .collect();

        let mut collections = Vec::with_capacity(file.collections.len());
        let mut members = HashMap::new();
        for entry in file.collections {
            let mut features: Vec<FeatureRecord> = entry
                .features
                .into_iter()
                .map(|f| FeatureRecord {
                    uri: f.uri.unwrap_or_else(|| format!("{}/{}", entry.uri, f.id)),
                    identifier: f.id,
                    title: f.title,
                    description: f.description,
                    is_part_of: vec![entry.uri.clone()],
                    geometries: f.geometries.into_iter().map(Geometry::from).collect(),
                })
                .collect();
            features.sort_by(|a, b| a.identifier.cmp(&b.identifier).then(a.uri.cmp(&b.uri)));

            members.insert(entry.uri.clone(), features);
            collections.push(ResourceRecord {
                uri: entry.uri,
                identifier: entry.id,
                title: entry.title,
                description: entry.description,
                is_part_of: Vec::new(),
                extent: entry.extent,
            });
        }
        collections.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        Self {
            dataset,
            conformance,
            collections,
            members,
        }
    }

    fn features(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.members.values().flatten()
    }
}

fn summary(record: &FeatureRecord) -> ResourceRecord {
    ResourceRecord {
        uri: record.uri.clone(),
        identifier: record.identifier.clone(),
        title: record.title.clone(),
        description: record.description.clone(),
        is_part_of: record.is_part_of.clone(),
        extent: None,
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn dataset(&self) -> Result<Option<DatasetRecord>, QueryError> {
        Ok(self.dataset.clone())
    }

    async fn conformance_targets(&self) -> Result<Vec<ConformanceRecord>, QueryError> {
        Ok(self.conformance.clone())
    }

    async fn collections(&self) -> Result<Vec<ResourceRecord>, QueryError> {
        Ok(self.collections.clone())
    }

    #[instrument(skip(self))]
    async fn lookup(
        &self,
        identifier: &str,
        kind: ResourceKind,
    ) -> Result<Vec<ResourceRecord>, QueryError> {
        let mut found: Vec<ResourceRecord> = match kind {
            ResourceKind::Collection => self
                .collections
                .iter()
                .filter(|c| c.identifier == identifier)
                .cloned()
                .collect(),
            ResourceKind::Feature => self
                .features()
                .filter(|f| f.identifier == identifier)
                .map(summary)
                .collect(),
        };
        found.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(found)
    }

    #[instrument(skip(self, filter), fields(filter = filter.map(|f| f.kind_name())))]
    async fn scan(
        &self,
        collection_uri: &str,
        filter: Option<&BboxFilter>,
    ) -> Result<Vec<String>, QueryError> {
        let Some(features) = self.members.get(collection_uri) else {
            return Ok(Vec::new());
        };
        let uris: Vec<String> = features
            .iter()
            .filter(|f| match filter {
                Some(filter) => f.geometries.iter().any(|g| g.matches(filter)),
                None => true,
            })
            .map(|f| f.uri.clone())
            .collect();
        debug!(count = uris.len(), "Scanned collection members");
        Ok(uris)
    }

    async fn count(&self, collection_uri: &str) -> Result<usize, QueryError> {
        Ok(self.members.get(collection_uri).map_or(0, Vec::len))
    }

    async fn describe(&self, uri: &str) -> Result<Option<FeatureRecord>, QueryError> {
        Ok(self.features().find(|f| f.uri == uri).cloned())
    }

    async fn ping(&self) -> Result<(), QueryError> {
        Ok(())
    }
}
