//! Feature geometries.
//!
//! A feature may carry several geometries, each with a role (boundary,
//! centroid, ...) and a CRS. WGS84 geometries are WKT strings; DGGS
//! geometries are space-separated cell lists. Only WGS84 geometries have a
//! GeoJSON form.

use geo::algorithm::orient::{Direction, Orient};
use geo::{Intersects, Rect};
use wkt::TryFromWkt;
use serde_json::{json, Value};
use std::fmt;

use crate::errors::ApiError;
use crate::geojson::GeoJsonGeometry;
use crate::queries::BboxFilter;
use crate::rdf::vocab::{iri, rdf_type, GEO, GEOMETRY_ROLES, GEOX, RDFS};
use crate::rdf::{Graph, Term};

/// Coordinate reference system of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    Wgs84,
    Dggs,
}

impl Crs {
    pub fn uri(&self) -> &'static str {
        match self {
            Crs::Wgs84 => "http://www.opengis.net/def/crs/OGC/1.3/CRS84",
            Crs::Dggs => "https://w3id.org/dggs/auspix",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Crs::Wgs84 => "WGS84",
            Crs::Dggs => "Auspix DGGS",
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a geometry represents for its feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeometryRole {
    Boundary,
    BoundingBox,
    BoundingCircle,
    Concave,
    Convex,
    Centroid,
    #[default]
    Detailed,
}

impl GeometryRole {
    pub const ALL: [GeometryRole; 7] = [
        GeometryRole::Boundary,
        GeometryRole::BoundingBox,
        GeometryRole::BoundingCircle,
        GeometryRole::Concave,
        GeometryRole::Convex,
        GeometryRole::Centroid,
        GeometryRole::Detailed,
    ];

    /// Local name within the geometry roles vocabulary.
    pub fn local_name(&self) -> &'static str {
        match self {
            GeometryRole::Boundary => "boundary",
            GeometryRole::BoundingBox => "bounding-box",
            GeometryRole::BoundingCircle => "bounding-circle",
            GeometryRole::Concave => "concave-hull",
            GeometryRole::Convex => "convex-hull",
            GeometryRole::Centroid => "centroid",
            GeometryRole::Detailed => "detailed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GeometryRole::Boundary => "Boundary",
            GeometryRole::BoundingBox => "Bounding Box",
            GeometryRole::BoundingCircle => "Bounding Circle",
            GeometryRole::Concave => "Concave Hull",
            GeometryRole::Convex => "Convex Hull",
            GeometryRole::Centroid => "Centroid",
            GeometryRole::Detailed => "Detailed",
        }
    }

    pub fn uri(&self) -> String {
        iri(GEOMETRY_ROLES, self.local_name())
    }

    /// Parse a role IRI or a bare token such as `boundingBox` or `bounding-box`.
    pub fn parse(value: &str) -> Option<Self> {
        let local = value
            .trim()
            .rsplit(|c: char| c == '/' || c == '#')
            .next()
            .unwrap_or("");
        let normalized: String = local
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "boundary" => Some(GeometryRole::Boundary),
            "boundingbox" => Some(GeometryRole::BoundingBox),
            "boundingcircle" => Some(GeometryRole::BoundingCircle),
            "concave" | "concavehull" => Some(GeometryRole::Concave),
            "convex" | "convexhull" => Some(GeometryRole::Convex),
            "centroid" => Some(GeometryRole::Centroid),
            "detailed" => Some(GeometryRole::Detailed),
            _ => None,
        }
    }
}

/// A serialized geometry attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// WKT for WGS84, a cell list for DGGS.
    pub coordinates: String,
    pub role: GeometryRole,
    pub label: Option<String>,
    pub crs: Crs,
}

impl Geometry {
    pub fn new(coordinates: impl Into<String>, role: GeometryRole, crs: Crs) -> Self {
        Self {
            coordinates: coordinates.into(),
            role,
            label: None,
            crs,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parse the WKT of a WGS84 geometry.
    pub fn to_geo(&self) -> Result<geo::Geometry<f64>, ApiError> {
        if self.crs != Crs::Wgs84 {
            return Err(ApiError::UnsupportedRepresentation(format!(
                "a {} geometry has no GeoJSON form",
                self.crs
            )));
        }
        parse_wkt(&self.coordinates).map_err(|e| {
            ApiError::UnsupportedRepresentation(format!("the geometry could not be read: {}", e))
        })
    }

    /// The GeoJSON geometry, with polygons wound by the right-hand rule.
    pub fn to_geojson_geometry(&self) -> Result<GeoJsonGeometry, ApiError> {
        let geometry = match self.to_geo()? {
            geo::Geometry::Polygon(p) => geo::Geometry::Polygon(p.orient(Direction::Default)),
            geo::Geometry::MultiPolygon(mp) => {
                geo::Geometry::MultiPolygon(mp.orient(Direction::Default))
            }
            other => other,
        };
        GeoJsonGeometry::from_geo(&geometry).ok_or_else(|| {
            ApiError::UnsupportedRepresentation("the geometry type has no GeoJSON form".to_string())
        })
    }

    /// Whether a WGS84 geometry intersects any of the rectangles.
    ///
    /// Geometries that cannot be parsed never match.
    pub fn intersects_any(&self, rects: &[Rect<f64>]) -> bool {
        match self.to_geo() {
            Ok(geometry) => rects.iter().any(|r| geometry.intersects(r)),
            Err(_) => false,
        }
    }

    /// Whether the geometry satisfies a bbox filter.
    pub fn matches(&self, filter: &BboxFilter) -> bool {
        match (self.crs, filter) {
            (Crs::Wgs84, BboxFilter::Coords { .. }) => self.intersects_any(&filter.rectangles()),
            (Crs::Dggs, BboxFilter::CellId(_) | BboxFilter::CellIds(_, _)) => {
                filter.matches_cells(&self.coordinates)
            }
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "coordinates": self.coordinates,
            "role": self.role.uri(),
            "label": self.label,
            "crs": self.crs.uri(),
        })
    }

    /// Attach this geometry to `subject` as a `geo:hasGeometry` blank node.
    pub fn add_to_graph(&self, g: &mut Graph, subject: &Term) {
        let node = g.blank_node();
        g.add(subject.clone(), iri(GEO, "hasGeometry"), node.clone());
        g.add(node.clone(), rdf_type(), Term::iri(iri(GEO, "Geometry")));
        g.add(node.clone(), iri(GEOX, "hasRole"), Term::iri(self.role.uri()));
        g.add(node.clone(), iri(GEOX, "inCRS"), Term::iri(self.crs.uri()));
        if let Some(label) = &self.label {
            g.add(node.clone(), iri(RDFS, "label"), Term::literal(label));
        }
        let (predicate, datatype) = match self.crs {
            Crs::Wgs84 => (iri(GEO, "asWKT"), iri(GEO, "wktLiteral")),
            Crs::Dggs => (iri(GEOX, "asDGGS"), iri(GEOX, "dggsLiteral")),
        };
        g.add(node, predicate, Term::typed(&self.coordinates, datatype));
    }
}

/// Parse WKT with an optional leading `<crs-uri>`. Z and M ordinates are
/// dropped.
pub fn parse_wkt(wkt: &str) -> Result<geo::Geometry<f64>, String> {
    let mut text = wkt.trim();
    if text.starts_with('<') {
        let close = text.find('>').ok_or("unterminated CRS IRI")?;
        text = text[close + 1..].trim_start();
    }
    geo::Geometry::<f64>::try_from_wkt_str(text).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, LineString, Point, Winding};

    #[test]
    fn test_parse_point_with_crs_prefix() {
        let g = parse_wkt("<http://www.opengis.net/def/crs/OGC/1.3/CRS84> POINT (149.1 -35.3)").unwrap();
        assert_eq!(g, geo::Geometry::Point(Point::new(149.1, -35.3)));
    }

    #[test]
    fn test_parse_multipolygon() {
        let g = parse_wkt(
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((10 10, 11 10, 11 11, 10 10), (10.2 10.1, 10.3 10.1, 10.3 10.2, 10.2 10.1)))",
        )
        .unwrap();
        match g {
            geo::Geometry::MultiPolygon(mp) => {
                assert_eq!(mp.0.len(), 2);
                assert_eq!(mp.0[1].interiors().len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_wkt("POINT 1 2").is_err());
        assert!(parse_wkt("CIRCLE (1 2)").is_err());
        assert!(parse_wkt("<http://unterminated POINT (1 2)").is_err());
        assert!(parse_wkt("").is_err());
    }

    #[test]
    fn test_parse_drops_z() {
        let g = parse_wkt("POINT Z (149.1 -35.3 12)").unwrap();
        assert_eq!(g, geo::Geometry::Point(Point::new(149.1, -35.3)));
    }

    #[test]
    fn test_clockwise_polygon_becomes_counter_clockwise() {
        let cw = "POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))";
        let geometry = Geometry::new(cw, GeometryRole::Boundary, Crs::Wgs84);
        match geometry.to_geojson_geometry().unwrap() {
            GeoJsonGeometry::Polygon { coordinates } => {
                let exterior: LineString<f64> =
                    coordinates[0].iter().map(|c| coord! { x: c[0], y: c[1] }).collect();
                assert!(exterior.is_ccw());

                let mut before: Vec<(i64, i64)> = vec![(0, 0), (0, 1), (1, 1), (1, 0)];
                let mut after: Vec<(i64, i64)> = coordinates[0][..4]
                    .iter()
                    .map(|c| (c[0] as i64, c[1] as i64))
                    .collect();
                before.sort();
                after.sort();
                assert_eq!(before, after);
            }
            other => panic!("expected polygon, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_dggs_geometry_has_no_geojson() {
        let geometry = Geometry::new("R1234 R1235", GeometryRole::Detailed, Crs::Dggs);
        assert!(matches!(
            geometry.to_geojson_geometry(),
            Err(ApiError::UnsupportedRepresentation(_))
        ));
    }

    #[test]
    fn test_matches_filters() {
        let wgs = Geometry::new("POINT (179.5 -30)", GeometryRole::Centroid, Crs::Wgs84);
        let dggs = Geometry::new("R1234 R1235", GeometryRole::Detailed, Crs::Dggs);

        let across = BboxFilter::parse("170,-40,-170,-20").unwrap();
        assert!(wgs.matches(&across));
        assert!(!dggs.matches(&across));

        let cell = BboxFilter::parse("R123").unwrap();
        assert!(dggs.matches(&cell));
        assert!(!wgs.matches(&cell));

        let elsewhere = BboxFilter::parse("0,0,10,10").unwrap();
        assert!(!wgs.matches(&elsewhere));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(
            GeometryRole::parse("https://linked.data.gov.au/def/geometry-roles/bounding-box"),
            Some(GeometryRole::BoundingBox)
        );
        assert_eq!(GeometryRole::parse("centroid"), Some(GeometryRole::Centroid));
        assert_eq!(GeometryRole::parse("ConvexHull"), Some(GeometryRole::Convex));
        assert_eq!(GeometryRole::parse("squiggle"), None);
        for role in GeometryRole::ALL {
            assert_eq!(GeometryRole::parse(&role.uri()), Some(role));
        }
    }

    #[test]
    fn test_graph_form() {
        let mut g = Graph::new();
        let subject = Term::iri("http://example.com/f");
        Geometry::new("R1", GeometryRole::Detailed, Crs::Dggs)
            .with_label("cells")
            .add_to_graph(&mut g, &subject);

        let nodes = g.objects(&subject, &iri(GEO, "hasGeometry"));
        assert_eq!(nodes.len(), 1);
        let node = nodes[0].clone();
        assert!(g.contains(
            &node,
            &iri(GEOX, "asDGGS"),
            &Term::typed("R1", iri(GEOX, "dggsLiteral"))
        ));
        assert!(g.contains(&node, &iri(RDFS, "label"), &Term::literal("cells")));
    }
}
