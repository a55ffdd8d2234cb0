//! Landing page, conformance and exception responses.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::conformance;
use crate::media::MediaType;
use crate::rdf::vocab::{iri, rdf_type, DCAT, DCTERMS};
use crate::rdf::{Graph, Term};
use crate::types::{HrefLang, Link, RelType};

/// The API root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandingPage {
    /// Base URI of the API.
    pub uri: String,

    /// Title of the dataset.
    pub title: String,

    /// Description of the dataset, rendered to HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links to related resources.
    pub links: Vec<Link>,
}

impl LandingPage {
    /// Create a new landing page with the standard links.
    pub fn new(base_url: &str, title: impl Into<String>, description: Option<String>) -> Self {
        let links = [
            Link::new(base_url, RelType::Self_)
                .with_type(MediaType::Json)
                .with_title("This document"),
            Link::new(format!("{}/spec", base_url), RelType::ServiceDesc)
                .with_type(MediaType::OpenApi)
                .with_title("API definition"),
            Link::new(format!("{}/doc", base_url), RelType::ServiceDoc)
                .with_type(MediaType::Html)
                .with_title("API documentation"),
            Link::new(format!("{}/conformance", base_url), RelType::Conformance)
                .with_type(MediaType::Json)
                .with_title("OGC API conformance classes implemented by this API"),
            Link::new(format!("{}/collections", base_url), RelType::Data)
                .with_type(MediaType::Json)
                .with_title("Information about the feature collections"),
        ]
        .into_iter()
        .map(|link| link.with_hreflang(HrefLang::En))
        .collect();

        Self {
            uri: base_url.to_string(),
            title: title.into(),
            description,
            links,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "title": self.title,
            "description": self.description,
            "links": self.links,
        })
    }

    /// The dataset described with DCAT.
    pub fn to_graph(&self) -> Graph {
        let mut g = Graph::new();
        let me = Term::iri(&self.uri);
        g.add(me.clone(), rdf_type(), Term::iri(iri(DCAT, "Dataset")));
        g.add(me.clone(), iri(DCTERMS, "title"), Term::literal(&self.title));
        if let Some(description) = &self.description {
            g.add(me, iri(DCTERMS, "description"), Term::literal(description));
        }
        g
    }
}

/// A conformance class declared by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConformanceClass {
    pub uri: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ConformanceClass {
    pub fn new(uri: impl Into<String>, title: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            title,
        }
    }
}

/// Conformance declaration response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConformanceClasses {
    pub classes: Vec<ConformanceClass>,
    pub links: Vec<Link>,
}

impl ConformanceClasses {
    /// Declare the given classes, or the defaults when there are none.
    pub fn new(base_url: &str, classes: Vec<ConformanceClass>) -> Self {
        let classes = if classes.is_empty() {
            Self::default_classes()
        } else {
            classes
        };
        Self {
            classes,
            links: vec![Link::new(format!("{}/conformance", base_url), RelType::Self_)
                .with_type(MediaType::Json)
                .with_title("This document")],
        }
    }

    /// Core, GeoJSON and HTML.
    pub fn default_classes() -> Vec<ConformanceClass> {
        vec![
            ConformanceClass::new(conformance::CORE, Some("Core".to_string())),
            ConformanceClass::new(conformance::GEOJSON, Some("GeoJSON".to_string())),
            ConformanceClass::new(conformance::HTML, Some("HTML".to_string())),
        ]
    }

    /// Check if a conformance class is declared.
    pub fn contains(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.uri == class)
    }

    pub fn to_json(&self) -> Value {
        let conforms_to: Vec<&str> = self.classes.iter().map(|c| c.uri.as_str()).collect();
        json!({
            "conformsTo": conforms_to,
            "links": self.links,
        })
    }
}

/// Exception response for errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Detailed error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI of the request that caused the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ExceptionResponse {
    /// Create a new exception response.
    pub fn new(type_: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            title: None,
            status: Some(status),
            detail: Some(detail.into()),
            instance: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the instance URI.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Create a 404 Not Found exception.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            "http://www.opengis.net/def/exceptions/ogcapi-features-1/1.0/not-found",
            404,
            detail,
        )
        .with_title("Not Found")
    }

    /// Create a 400 Bad Request exception.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(
            "http://www.opengis.net/def/exceptions/ogcapi-features-1/1.0/invalid-parameter-value",
            400,
            detail,
        )
        .with_title("Bad Request")
    }

    /// Create a 500 Internal Server Error exception.
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(
            "http://www.opengis.net/def/exceptions/ogcapi-features-1/1.0/server-error",
            500,
            detail,
        )
        .with_title("Internal Server Error")
    }
}
