//! The sample dataset and values that select known parts of it.

use std::path::PathBuf;
use std::sync::Arc;

use graph_store::{GraphStore, MemoryStore};
use tempfile::TempDir;

/// The sample dataset as shipped in `data/sample-dataset.yaml`.
pub const SAMPLE_DATASET: &str = include_str!("../../../data/sample-dataset.yaml");

/// Base URL used by test configurations.
pub const BASE_URL: &str = "http://localhost:5000";

/// Store URIs of the sample collections.
pub mod uris {
    pub const CATCH: &str = "http://store.example/collection/catch";
    pub const RIVER: &str = "http://store.example/collection/river";
    pub const CATCH_101: &str = "http://store.example/catch/101";
    pub const RIVER_101: &str = "http://store.example/river/101";
}

/// Feature counts of the sample collections.
pub mod counts {
    pub const CATCH: usize = 5;
    pub const RIVER: usize = 2;
}

/// `bbox` values and the `catch` features they select.
pub mod bbox {
    /// Around Upper Creek only.
    pub const UPPER_CREEK: &str = "144,-39,146.5,-36.5";
    pub const UPPER_CREEK_IDS: &[&str] = &["101"];

    /// Crosses the antimeridian; selects the atolls on both sides.
    pub const ANTIMERIDIAN: &str = "178,-25,-178,-15";
    pub const ANTIMERIDIAN_IDS: &[&str] = &["103", "104"];

    /// Open ocean.
    pub const EMPTY: &str = "0,0,1,1";

    /// One DGGS cell; a prefix of Upper Creek's cells.
    pub const CELL: &str = "R123";
    pub const CELL_IDS: &[&str] = &["101"];

    /// Two DGGS cells.
    pub const CELL_PAIR: &str = "R2345,R789";
    pub const CELL_PAIR_IDS: &[&str] = &["102", "105"];

    /// Matches none of the accepted shapes.
    pub const MALFORMED: &str = "abc";
}

/// The sample dataset loaded into a memory store.
pub fn sample_store() -> MemoryStore {
    match MemoryStore::from_yaml_str(SAMPLE_DATASET) {
        Ok(store) => store,
        Err(e) => panic!("sample dataset is invalid: {}", e),
    }
}

/// [`sample_store`] behind the trait object the service holds.
pub fn shared_sample_store() -> Arc<dyn GraphStore> {
    Arc::new(sample_store())
}

/// Write the sample dataset into a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the file is needed.
pub fn write_sample_dataset() -> (TempDir, PathBuf) {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("cannot create temp dir: {}", e),
    };
    let path = dir.path().join("dataset.yaml");
    if let Err(e) = std::fs::write(&path, SAMPLE_DATASET) {
        panic!("cannot write sample dataset: {}", e);
    }
    (dir, path)
}
