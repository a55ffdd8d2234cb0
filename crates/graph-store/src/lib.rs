//! Graph store access for the features API.
//!
//! The API never talks to a triple store directly; it goes through the
//! [`GraphStore`] trait, which answers the handful of questions the API asks
//! (which collections exist, which features belong to a collection, what a
//! feature looks like). Two implementations are provided:
//!
//! - [`SparqlStore`]: SPARQL 1.1 protocol over HTTP
//! - [`MemoryStore`]: an in-process dataset loaded from YAML or JSON

pub mod error;
pub mod memory;
pub mod records;
pub mod retry;
pub mod sparql;
pub mod store;

pub use error::QueryError;
pub use memory::{DatasetFile, MemoryStore};
pub use records::{ConformanceRecord, DatasetRecord, FeatureRecord, ResourceKind, ResourceRecord};
pub use retry::RetryPolicy;
pub use sparql::SparqlStore;
pub use store::GraphStore;
