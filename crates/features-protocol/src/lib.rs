//! OGC API - Features, Linked Data edition
//!
//! Protocol types for a features API whose resources are available in
//! several representation profiles (plain API view, GeoSPARQL, DCAT) and
//! several media types per profile.
//!
//! Everything in this crate is pure: entities are built from already-fetched
//! records and each exposes its structured-JSON, GeoJSON and RDF graph forms.
//!
//! # Example
//!
//! ```rust
//! use features_protocol::{Collection, PageWindow};
//!
//! let collection = Collection::new("http://localhost:5000", "catch")
//!     .with_title("Catchments");
//! assert_eq!(collection.uri, "http://localhost:5000/collections/catch");
//!
//! let window = PageWindow::new(2, 20, None);
//! assert_eq!((window.start, window.end), (20, 40));
//! ```

pub mod collections;
pub mod errors;
pub mod features;
pub mod geojson;
pub mod geometry;
pub mod markdown;
pub mod media;
pub mod profiles;
pub mod queries;
pub mod rdf;
pub mod responses;
pub mod types;

// Re-export commonly used types
pub use collections::{Collection, CollectionList};
pub use errors::ApiError;
pub use features::{Feature, FeaturePage};
pub use geometry::{Crs, Geometry, GeometryRole};
pub use media::MediaType;
pub use profiles::Profile;
pub use queries::{BboxFilter, PageWindow};
pub use rdf::Graph;
pub use responses::{ConformanceClass, ConformanceClasses, ExceptionResponse, LandingPage};
pub use types::{Extent, HrefLang, Link, RelType};

/// OGC API - Features conformance class URIs
pub mod conformance {
    /// Core conformance class
    pub const CORE: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core";
    /// OpenAPI 3.0 conformance class
    pub const OAS30: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/oas30";
    /// HTML conformance class
    pub const HTML: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/html";
    /// GeoJSON conformance class
    pub const GEOJSON: &str = "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson";
}
