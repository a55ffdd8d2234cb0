//! GeoJSON types for feature responses.
//!
//! Only the geometry types the API emits are modelled. Coordinates are
//! `[longitude, latitude]` pairs in WGS84.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Link;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoJsonFeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<GeoJsonFeature>,

    #[serde(rename = "numberMatched", skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<usize>,

    #[serde(rename = "numberReturned")]
    pub number_returned: usize,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub links: Vec<Link>,
}

impl GeoJsonFeatureCollection {
    pub fn new(features: Vec<GeoJsonFeature>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            number_returned: features.len(),
            features,
            number_matched: None,
            links: Vec::new(),
        }
    }

    /// Set the total number of features matching the request.
    pub fn with_number_matched(mut self, matched: usize) -> Self {
        self.number_matched = Some(matched);
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoJsonFeature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Serialized as `null` when absent.
    pub geometry: Option<GeoJsonGeometry>,

    pub properties: Map<String, Value>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub links: Vec<Link>,
}

impl GeoJsonFeature {
    pub fn new(geometry: Option<GeoJsonGeometry>) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry,
            properties: Map::new(),
            links: Vec::new(),
        }
    }

    /// Set the feature ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set a property. `None` values are left out.
    pub fn with_property(mut self, key: &str, value: Option<Value>) -> Self {
        if let Some(value) = value {
            self.properties.insert(key.to_string(), value);
        }
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }
}

/// GeoJSON geometry types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl GeoJsonGeometry {
    /// Convert from a `geo` geometry. Returns `None` for types GeoJSON output does not cover.
    pub fn from_geo(geometry: &geo::Geometry<f64>) -> Option<Self> {
        match geometry {
            geo::Geometry::Point(p) => Some(GeoJsonGeometry::Point {
                coordinates: [p.x(), p.y()],
            }),
            geo::Geometry::LineString(ls) => Some(GeoJsonGeometry::LineString {
                coordinates: line_coords(ls),
            }),
            geo::Geometry::Polygon(p) => Some(GeoJsonGeometry::Polygon {
                coordinates: polygon_coords(p),
            }),
            geo::Geometry::MultiPolygon(mp) => Some(GeoJsonGeometry::MultiPolygon {
                coordinates: mp.0.iter().map(polygon_coords).collect(),
            }),
            _ => None,
        }
    }

    /// Get the geometry type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            GeoJsonGeometry::Point { .. } => "Point",
            GeoJsonGeometry::LineString { .. } => "LineString",
            GeoJsonGeometry::Polygon { .. } => "Polygon",
            GeoJsonGeometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }
}

fn line_coords(ls: &geo::LineString<f64>) -> Vec<[f64; 2]> {
    ls.coords().map(|c| [c.x, c.y]).collect()
}

fn polygon_coords(polygon: &geo::Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(line_coords)
        .collect()
}
