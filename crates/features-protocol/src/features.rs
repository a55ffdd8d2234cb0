//! Features and pages of features.

use serde_json::{json, Value};

use crate::collections::Collection;
use crate::errors::ApiError;
use crate::geojson::{GeoJsonFeature, GeoJsonFeatureCollection, GeoJsonGeometry};
use crate::geometry::{Crs, Geometry};
use crate::media::MediaType;
use crate::queries::PageWindow;
use crate::rdf::vocab::{iri, rdf_type, DCTERMS, GEO, LDP, OWL, XHV};
use crate::rdf::{Graph, Term};
use crate::types::{path_segment, Link, RelType};

/// An addressable entity owned by exactly one collection.
///
/// Identifiers are unique within a collection only, so the canonical URI
/// includes the collection: `{base}/collections/{collection_id}/item/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub collection_id: String,
    pub source_uri: Option<String>,
    pub uri: String,
    /// Canonical URI of the owning collection.
    pub is_part_of: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub geometries: Vec<Geometry>,
    pub links: Vec<Link>,
}

impl Feature {
    pub fn new(base_url: &str, collection_id: impl Into<String>, id: impl Into<String>) -> Self {
        let collection_id = collection_id.into();
        let id = id.into();
        let is_part_of = format!("{}/collections/{}", base_url, path_segment(&collection_id));
        let uri = format!("{}/item/{}", is_part_of, path_segment(&id));
        let links = vec![
            Link::new(format!("{}/items/{}", is_part_of, path_segment(&id)), RelType::Self_)
                .with_type(MediaType::Json)
                .with_title("This document"),
            Link::new(is_part_of.clone(), RelType::Collection)
                .with_type(MediaType::Json)
                .with_title("The collection this feature is part of"),
        ];
        Self {
            id,
            collection_id,
            source_uri: None,
            uri,
            is_part_of,
            title: None,
            description: None,
            geometries: Vec::new(),
            links,
        }
    }

    pub fn with_source_uri(mut self, source_uri: impl Into<String>) -> Self {
        self.source_uri = Some(source_uri.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_geometries(mut self, geometries: Vec<Geometry>) -> Self {
        self.geometries = geometries;
        self
    }

    /// Resolvable URL of this feature in the API.
    pub fn href(&self) -> String {
        format!("{}/items/{}", self.is_part_of, path_segment(&self.id))
    }

    /// The first WGS84 geometry, if any.
    pub fn wgs84_geometry(&self) -> Option<&Geometry> {
        self.geometries.iter().find(|g| g.crs == Crs::Wgs84)
    }

    pub fn to_json(&self) -> Value {
        let geometries: Vec<Value> = self.geometries.iter().map(Geometry::to_json).collect();
        json!({
            "id": self.id,
            "uri": self.uri,
            "title": self.title,
            "description": self.description,
            "isPartOf": self.is_part_of,
            "geometries": geometries,
            "links": self.links,
        })
    }

    /// Short form used in item listings.
    pub fn summary_json(&self) -> Value {
        json!({
            "id": self.id,
            "uri": self.uri,
            "title": self.title,
            "links": [Link::new(self.href(), RelType::Self_).with_type(MediaType::Json)],
        })
    }

    fn geojson_feature(&self, geometry: Option<GeoJsonGeometry>) -> GeoJsonFeature {
        GeoJsonFeature::new(geometry)
            .with_id(self.id.clone())
            .with_property("title", self.title.clone().map(Value::String))
            .with_property("isPartOf", Some(Value::String(self.is_part_of.clone())))
            .with_property("description", self.description.clone().map(Value::String))
            .with_links(self.links.clone())
    }

    /// The GeoJSON Feature built from the first WGS84 geometry.
    ///
    /// Fails when the feature has no WGS84 geometry.
    pub fn to_geojson_feature(&self) -> Result<GeoJsonFeature, ApiError> {
        let geometry = self.wgs84_geometry().ok_or_else(|| {
            ApiError::UnsupportedRepresentation(format!(
                "the Feature '{}' has no WGS84 geometry and cannot be rendered as GeoJSON",
                self.id
            ))
        })?;
        Ok(self.geojson_feature(Some(geometry.to_geojson_geometry()?)))
    }

    /// Like [`Feature::to_geojson_feature`] but with a `null` geometry
    /// instead of an error, for use inside collections.
    pub fn to_geojson_feature_lenient(&self) -> GeoJsonFeature {
        let geometry = self
            .wgs84_geometry()
            .and_then(|g| g.to_geojson_geometry().ok());
        self.geojson_feature(geometry)
    }

    pub fn to_geojson(&self) -> Result<Value, ApiError> {
        serde_json::to_value(self.to_geojson_feature()?).map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// The feature described with GeoSPARQL.
    pub fn to_graph(&self) -> Graph {
        let mut g = Graph::new();
        let me = Term::iri(&self.uri);
        g.add(me.clone(), rdf_type(), Term::iri(iri(GEO, "Feature")));
        g.add(me.clone(), iri(DCTERMS, "identifier"), Term::literal(&self.id));
        g.add(me.clone(), iri(DCTERMS, "isPartOf"), Term::iri(&self.is_part_of));
        if let Some(title) = &self.title {
            g.add(me.clone(), iri(DCTERMS, "title"), Term::literal(title));
        }
        if let Some(description) = &self.description {
            g.add(me.clone(), iri(DCTERMS, "description"), Term::literal(description));
        }
        if let Some(source) = self.source_uri.as_deref().filter(|s| *s != self.uri) {
            g.add(me.clone(), iri(OWL, "sameAs"), Term::iri(source));
        }
        for geometry in &self.geometries {
            geometry.add_to_graph(&mut g, &me);
        }
        g
    }
}

/// One page of a collection's items.
///
/// `collection.features` holds the page; `collection.feature_count` holds
/// the number of features matching the request across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePage {
    pub collection: Collection,
    pub window: PageWindow,
    /// The raw `bbox` value, kept for navigation links.
    pub bbox: Option<String>,
    pub links: Vec<Link>,
}

impl FeaturePage {
    pub fn new(collection: Collection, window: PageWindow, bbox: Option<String>) -> Self {
        let mut page = Self {
            collection,
            window,
            bbox,
            links: Vec::new(),
        };
        let base = page.collection.items_uri();
        let matched = page.number_matched();
        let collection_title = page
            .collection
            .title
            .clone()
            .unwrap_or_else(|| page.collection.id.clone());
        let mut links = vec![
            Link::new(page.page_uri(page.window.page), RelType::Self_)
                .with_type(MediaType::Json)
                .with_title("This document"),
            Link::new(page.collection.uri.clone(), RelType::Collection)
                .with_type(MediaType::Json)
                .with_title(collection_title),
        ];
        links.extend(page.window.nav_links(&base, &page.extra_params(), matched, MediaType::Json));
        page.links = links;
        page
    }

    fn extra_params(&self) -> Vec<(&str, &str)> {
        match &self.bbox {
            Some(bbox) => vec![("bbox", bbox.as_str())],
            None => Vec::new(),
        }
    }

    /// Features matching the request across all pages.
    pub fn number_matched(&self) -> usize {
        self.collection
            .feature_count
            .unwrap_or(self.collection.features.len())
    }

    pub fn features(&self) -> &[Feature] {
        &self.collection.features
    }

    /// URL of one page of this listing.
    pub fn page_uri(&self, page: usize) -> String {
        self.window
            .page_href(&self.collection.items_uri(), page, &self.extra_params())
    }

    pub fn to_json(&self) -> Value {
        let items: Vec<Value> = self.features().iter().map(Feature::summary_json).collect();
        json!({
            "links": self.links,
            "collection": self.collection.to_json(),
            "numberMatched": self.number_matched(),
            "numberReturned": items.len(),
            "items": items,
        })
    }

    /// A FeatureCollection. Features without a WGS84 geometry have a `null` geometry.
    pub fn to_geojson(&self) -> Result<Value, ApiError> {
        let features = self
            .features()
            .iter()
            .map(Feature::to_geojson_feature_lenient)
            .collect();
        let links = self
            .links
            .iter()
            .cloned()
            .map(|l| match l.type_ {
                Some(MediaType::Json) => l.with_type(MediaType::GeoJson),
                _ => l,
            })
            .collect();
        let collection = GeoJsonFeatureCollection::new(features)
            .with_number_matched(self.number_matched())
            .with_links(links);
        serde_json::to_value(collection).map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// The page as an `ldp:Page` with `xhv` navigation, the collection and
    /// every feature on the page.
    pub fn to_graph(&self) -> Graph {
        let mut g = Graph::new();
        let total = self.number_matched();
        let me = Term::iri(self.page_uri(self.window.page));

        g.add(me.clone(), rdf_type(), Term::iri(iri(LDP, "Page")));
        g.add(me.clone(), iri(LDP, "pageOf"), Term::iri(&self.collection.uri));
        g.add(me.clone(), iri(XHV, "first"), Term::iri(self.page_uri(1)));
        g.add(
            me.clone(),
            iri(XHV, "last"),
            Term::iri(self.page_uri(self.window.last_page(total))),
        );
        if let Some(prev) = self.window.prev_page() {
            g.add(me.clone(), iri(XHV, "prev"), Term::iri(self.page_uri(prev)));
        }
        if let Some(next) = self.window.next_page(total) {
            g.add(me, iri(XHV, "next"), Term::iri(self.page_uri(next)));
        }

        g.merge(self.collection.to_graph());
        for feature in self.features() {
            g.merge(feature.to_graph());
        }
        g
    }
}
