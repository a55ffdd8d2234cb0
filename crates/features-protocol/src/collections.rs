//! Feature collections.

use serde_json::{json, Value};

use crate::features::Feature;
use crate::markdown::markdown_to_html;
use crate::media::MediaType;
use crate::queries::PageWindow;
use crate::rdf::vocab::{iri, rdf_type, DCTERMS, GEO, GEOX, OWL};
use crate::rdf::{Graph, Term};
use crate::types::{path_segment, Extent, Link, RelType};

/// A named group of features.
///
/// The canonical URI is always `{base}/collections/{id}`; the URI the graph
/// store uses for the same collection is kept separately as `source_uri`.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub id: String,
    pub uri: String,
    pub source_uri: Option<String>,
    pub title: Option<String>,
    /// Rendered HTML.
    pub description: Option<String>,
    pub extent: Option<Extent>,
    pub feature_count: Option<usize>,
    /// Populated for item listings only.
    pub features: Vec<Feature>,
    pub links: Vec<Link>,
}

impl Collection {
    pub fn new(base_url: &str, id: impl Into<String>) -> Self {
        let id = id.into();
        let uri = format!("{}/collections/{}", base_url, path_segment(&id));
        let links = vec![
            Link::new(uri.clone(), RelType::Self_)
                .with_type(MediaType::Json)
                .with_title("This document"),
            Link::new(format!("{}/items", uri), RelType::Items)
                .with_type(MediaType::GeoJson)
                .with_title("The features of this collection"),
        ];
        Self {
            id,
            uri,
            source_uri: None,
            title: None,
            description: None,
            extent: None,
            feature_count: None,
            features: Vec::new(),
            links,
        }
    }

    pub fn with_source_uri(mut self, source_uri: impl Into<String>) -> Self {
        self.source_uri = Some(source_uri.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if let Some(items) = self.links.iter_mut().find(|l| l.rel == RelType::Items) {
            items.title = Some(title.clone());
        }
        self.title = Some(title);
        self
    }

    /// Set the description from markdown.
    pub fn with_description(mut self, markdown: &str) -> Self {
        self.description = Some(markdown_to_html(markdown));
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_feature_count(mut self, count: usize) -> Self {
        self.feature_count = Some(count);
        self
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn items_uri(&self) -> String {
        format!("{}/items", self.uri)
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "id": self.id,
            "uri": self.uri,
            "title": self.title,
            "description": self.description,
            "links": self.links,
        });
        if let Some(extent) = &self.extent {
            value["extent"] = json!(extent);
        }
        if let Some(count) = self.feature_count {
            value["featureCount"] = json!(count);
        }
        value
    }

    /// The collection described with GeoSPARQL. Member features are not included.
    pub fn to_graph(&self) -> Graph {
        let mut g = Graph::new();
        let me = Term::iri(&self.uri);
        g.add(me.clone(), rdf_type(), Term::iri(iri(GEO, "FeatureCollection")));
        g.add(me.clone(), iri(DCTERMS, "identifier"), Term::literal(&self.id));
        if let Some(title) = &self.title {
            g.add(me.clone(), iri(DCTERMS, "title"), Term::literal(title));
        }
        if let Some(description) = &self.description {
            g.add(me.clone(), iri(DCTERMS, "description"), Term::literal(description));
        }
        if let Some(source) = self.source_uri.as_deref().filter(|s| *s != self.uri) {
            g.add(me.clone(), iri(OWL, "sameAs"), Term::iri(source));
        }
        if let Some(count) = self.feature_count {
            g.add(me, iri(GEOX, "featureCount"), Term::integer(count));
        }
        g
    }
}

/// One page of the collections listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionList {
    pub uri: String,
    pub collections: Vec<Collection>,
    pub window: PageWindow,
    /// Number of collections across all pages.
    pub total: usize,
    pub links: Vec<Link>,
}

impl CollectionList {
    pub fn new(base_url: &str, collections: Vec<Collection>, window: PageWindow, total: usize) -> Self {
        let uri = format!("{}/collections", base_url);
        let mut links = vec![Link::new(uri.clone(), RelType::Self_)
            .with_type(MediaType::Json)
            .with_title("This document")];
        links.extend(window.nav_links(&uri, &[], total, MediaType::Json));
        Self {
            uri,
            collections,
            window,
            total,
            links,
        }
    }

    pub fn to_json(&self) -> Value {
        let collections: Vec<Value> = self.collections.iter().map(Collection::to_json).collect();
        json!({
            "links": self.links,
            "numberMatched": self.total,
            "numberReturned": self.collections.len(),
            "collections": collections,
        })
    }
}
