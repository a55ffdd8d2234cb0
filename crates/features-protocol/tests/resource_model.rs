//! Integration tests for the resource model: entities built from literal
//! values, without any store.

use features_protocol::rdf::vocab::{iri, DCTERMS, GEO};
use features_protocol::rdf::Term;
use features_protocol::{
    ApiError, BboxFilter, Collection, Crs, Feature, FeaturePage, Geometry, GeometryRole,
    MediaType, PageWindow, RelType,
};

const BASE: &str = "http://localhost:5000";

fn catchment(id: &str, wkt: &str) -> Feature {
    Feature::new(BASE, "catch", id)
        .with_source_uri(format!("http://linked.data.gov.au/dataset/geofabric/catch/{}", id))
        .with_title(format!("Catchment {}", id))
        .with_geometries(vec![
            Geometry::new(wkt, GeometryRole::Boundary, Crs::Wgs84).with_label("Boundary"),
            Geometry::new(format!("R{}", id), GeometryRole::Detailed, Crs::Dggs),
        ])
}

#[test]
fn test_window_formula_without_limit() {
    for page in 1..=6 {
        for per_page in [1, 2, 5, 20, 1000] {
            let window = PageWindow::from_params(
                Some(page.to_string().as_str()),
                Some(per_page.to_string().as_str()),
                None,
                1000,
            )
            .unwrap();
            assert_eq!(window.start, (page - 1) * per_page);
            assert_eq!(window.end, page * per_page);
        }
    }
}

#[test]
fn test_limit_ignores_page_and_per_page() {
    for (page, per_page) in [("1", "20"), ("9", "3"), ("2", "1000")] {
        let window = PageWindow::from_params(Some(page), Some(per_page), Some("12"), 1000).unwrap();
        assert_eq!((window.start, window.end), (0, 12));
    }
}

#[test]
fn test_bbox_shapes() {
    assert_eq!(BboxFilter::parse("160.6,-55.95,-170,-25.89").unwrap().kind_name(), "coords");
    assert_eq!(BboxFilter::parse("R1234").unwrap().kind_name(), "cell_id");
    assert_eq!(BboxFilter::parse("R123,R456").unwrap().kind_name(), "cell_ids");

    let err = BboxFilter::parse("not-a-bbox").unwrap_err();
    assert_eq!(err.status_code(), 400);
    let message = err.to_string();
    for shape in ["coords", "cell_id", "cell_ids"] {
        assert!(message.contains(shape), "{} missing from {}", shape, message);
    }
}

#[test]
fn test_clockwise_polygon_rewound_with_same_vertices() {
    // clockwise exterior
    let feature = catchment("101", "POLYGON ((149 -35, 149 -34, 150 -34, 150 -35, 149 -35))");
    let json = feature.to_geojson().unwrap();
    let ring: Vec<(f64, f64)> = json["geometry"]["coordinates"][0]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (c[0].as_f64().unwrap(), c[1].as_f64().unwrap()))
        .collect();

    // shoelace: positive area means counter-clockwise
    let area: f64 = ring
        .windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum();
    assert!(area > 0.0, "exterior ring should be counter-clockwise");

    let mut input = vec![(149.0, -35.0), (149.0, -34.0), (150.0, -34.0), (150.0, -35.0)];
    let mut output: Vec<(f64, f64)> = ring[..ring.len() - 1].to_vec();
    input.sort_by(|a, b| a.partial_cmp(b).unwrap());
    output.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(input, output);
    assert_eq!(ring.first(), ring.last());
}

#[test]
fn test_dggs_only_feature_refuses_geojson() {
    let feature = Feature::new(BASE, "catch", "900")
        .with_geometries(vec![Geometry::new("R9", GeometryRole::Detailed, Crs::Dggs)]);
    let err = feature.to_geojson().unwrap_err();
    assert!(matches!(err, ApiError::UnsupportedRepresentation(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_page_renders_in_every_rdf_type() {
    let collection = Collection::new(BASE, "catch")
        .with_title("Catchments")
        .with_feature_count(5)
        .with_features(vec![
            catchment("101", "POINT (149 -35)"),
            catchment("102", "POINT (150 -35)"),
        ]);
    let page = FeaturePage::new(collection, PageWindow::new(1, 2, None), None);
    let graph = page.to_graph();

    let feature = Term::iri("http://localhost:5000/collections/catch/item/101");
    assert!(graph.contains(
        &feature,
        &iri(DCTERMS, "isPartOf"),
        &Term::iri("http://localhost:5000/collections/catch")
    ));
    assert_eq!(graph.objects(&feature, &iri(GEO, "hasGeometry")).len(), 2);

    for media_type in [
        MediaType::Turtle,
        MediaType::N3,
        MediaType::NTriples,
        MediaType::JsonLd,
        MediaType::Json,
        MediaType::RdfXml,
    ] {
        let first = graph.serialize(media_type).unwrap();
        let second = page.to_graph().serialize(media_type).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second, "{} output should be deterministic", media_type);
    }
}

#[test]
fn test_page_links_carry_bbox() {
    let collection = Collection::new(BASE, "catch").with_feature_count(3);
    let page = FeaturePage::new(collection, PageWindow::new(1, 1, None), Some("R1".to_string()));
    let next = page.links.iter().find(|l| l.rel == RelType::Next).unwrap();
    assert_eq!(
        next.href,
        "http://localhost:5000/collections/catch/items?page=2&per_page=1&bbox=R1"
    );
}
