//! End-to-end requests against the router over the sample dataset.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use features_api::config::ServiceConfig;
use features_api::state::AppState;
use features_protocol::BboxFilter;
use graph_store::{
    ConformanceRecord, DatasetRecord, FeatureRecord, GraphStore, MemoryStore, QueryError,
    ResourceKind, ResourceRecord,
};
use test_utils::{bbox, counts, shared_sample_store, BASE_URL};

fn app() -> Router {
    app_with_store(shared_sample_store())
}

fn app_with_store(store: Arc<dyn GraphStore>) -> Router {
    let config = ServiceConfig {
        base_url: BASE_URL.to_string(),
        ..Default::default()
    };
    let state = AppState::with_store(config, store).unwrap();
    features_api::router(Arc::new(state))
}

struct Reply {
    status: StatusCode,
    content_type: String,
    link: String,
    content_profile: String,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn get(app: Router, uri: &str, headers: &[(&str, &str)]) -> Reply {
    let mut request = Request::builder().uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let header_str = |name: &str| {
        response
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default()
    };
    let status = response.status();
    let content_type = header_str(header::CONTENT_TYPE.as_str());
    let link = header_str(header::LINK.as_str());
    let content_profile = header_str("content-profile");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Reply {
        status,
        content_type,
        link,
        content_profile,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

fn item_ids(reply: &Reply) -> Vec<String> {
    reply.json()["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_first_page_of_catchments() {
    let reply = get(app(), "/collections/catch/items?per_page=2&page=1&_mediatype=application/json", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);

    let body = reply.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["numberMatched"], counts::CATCH);
    assert_eq!(body["collection"]["featureCount"], counts::CATCH);

    let rels: Vec<&str> = body["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["rel"].as_str().unwrap())
        .collect();
    assert!(rels.contains(&"next"));
    assert!(!rels.contains(&"prev"));
    let next = body["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["rel"] == "next")
        .unwrap();
    assert!(next["href"].as_str().unwrap().contains("page=2"));
}

#[tokio::test]
async fn test_disallowed_parameter_is_named() {
    let reply = get(app(), "/collections/catch/items?colour=blue&_profile=nope", &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json()["detail"].as_str().unwrap().contains("'colour'"));

    let reply = get(app(), "/collections/catch/items/101?bbox=R1", &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("'bbox'"));
}

#[tokio::test]
async fn test_landing_page_defaults_to_html() {
    let reply = get(app(), "/", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, "text/html; charset=utf-8");
    assert!(reply.body.contains("Geofabric Sample"));
    assert!(reply.link.contains("rel=\"self\""));
}

#[tokio::test]
async fn test_landing_page_dcat_turtle() {
    let reply = get(app(), "/?_profile=dcat&_mediatype=text/turtle", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.content_type.starts_with("text/turtle"));
    assert!(reply.body.contains("dcat:Dataset"));
}

#[tokio::test]
async fn test_geosp_profile_defaults_to_turtle() {
    let reply = get(app(), "/collections/catch/items/101?_profile=geosp", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.content_type.starts_with("text/turtle"));
    assert_eq!(reply.content_profile, "<http://www.opengis.net/ont/geosparql>");
    assert!(reply.body.contains("geo:Feature"));
    assert!(reply.body.contains("<http://localhost:5000/collections/catch/item/101>"));
}

#[tokio::test]
async fn test_unknown_profile_is_rejected() {
    let reply = get(app(), "/collections/catch/items/101?_profile=fancy", &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("oai, geosp, alt"));
}

#[tokio::test]
async fn test_accept_weights_select_turtle() {
    let reply = get(
        app(),
        "/collections/catch/items/101?_profile=geosp",
        &[("accept", "application/json;q=0.5, text/turtle;q=0.9")],
    )
    .await;
    assert!(reply.content_type.starts_with("text/turtle"));
}

#[tokio::test]
async fn test_accept_profile_uri_selects_geosp() {
    let reply = get(
        app(),
        "/collections/catch",
        &[
            ("accept-profile", "<http://www.opengis.net/ont/geosparql>"),
            ("accept", "application/n-triples"),
        ],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, "application/n-triples");
    assert!(reply
        .body
        .contains("<http://localhost:5000/collections/catch> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.opengis.net/ont/geosparql#FeatureCollection> ."));
}

#[tokio::test]
async fn test_view_and_format_aliases() {
    let reply = get(app(), "/collections/catch/items/101?_view=geosp&_format=application/ld%2Bjson", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, "application/ld+json");
    assert!(reply.json()["@graph"].is_array());
}

#[tokio::test]
async fn test_json_in_rdf_profile_is_jsonld() {
    let reply = get(app(), "/collections/catch/items/101?_profile=geosp&_mediatype=application/json", &[]).await;
    assert_eq!(reply.content_type, "application/json");
    assert!(reply.json().get("@context").is_some());
}

#[tokio::test]
async fn test_malformed_accept_is_rejected() {
    let reply = get(app(), "/collections", &[("accept", "application/json;q=lots")]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_geojson_item_is_right_hand_wound() {
    let reply = get(app(), "/collections/catch/items/102?_mediatype=application/geo%2Bjson", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, "application/geo+json");

    let body = reply.json();
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["properties"]["isPartOf"], "http://localhost:5000/collections/catch");
    let ring: Vec<(f64, f64)> = body["geometry"]["coordinates"][0]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p[0].as_f64().unwrap(), p[1].as_f64().unwrap()))
        .collect();
    let twice_area: f64 = ring
        .windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum();
    assert!(twice_area > 0.0, "exterior ring is not counter-clockwise");
}

#[tokio::test]
async fn test_dggs_only_feature_has_no_geojson() {
    let reply = get(app(), "/collections/catch/items/105?_mediatype=application/geo%2Bjson", &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("WGS84"));

    let reply = get(app(), "/collections/catch/items/105?_profile=geosp", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("dggsLiteral"));
}

#[tokio::test]
async fn test_bbox_filters() {
    for (value, expected) in [
        (bbox::UPPER_CREEK, bbox::UPPER_CREEK_IDS),
        (bbox::ANTIMERIDIAN, bbox::ANTIMERIDIAN_IDS),
        (bbox::CELL, bbox::CELL_IDS),
        (bbox::CELL_PAIR, bbox::CELL_PAIR_IDS),
        (bbox::EMPTY, &[][..]),
    ] {
        let uri = format!(
            "/collections/catch/items?_mediatype=application/geo%2Bjson&bbox={}",
            value
        );
        let reply = get(app(), &uri, &[]).await;
        assert_eq!(reply.status, StatusCode::OK, "bbox {}", value);
        assert_eq!(item_ids(&reply), expected, "bbox {}", value);
        assert_eq!(reply.json()["numberMatched"], expected.len());
    }
}

#[tokio::test]
async fn test_malformed_bbox_lists_shapes() {
    let uri = format!("/collections/catch/items?bbox={}", bbox::MALFORMED);
    let reply = get(app(), &uri, &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let detail = reply.json()["detail"].as_str().unwrap().to_string();
    for shape in ["coords", "cell_id", "cell_ids"] {
        assert!(detail.contains(shape), "{} missing from {}", shape, detail);
    }
}

#[tokio::test]
async fn test_limit_overrides_paging() {
    let reply = get(app(), "/collections/catch/items?limit=3&page=2&per_page=1&_mediatype=application/json", &[]).await;
    assert_eq!(reply.json()["numberReturned"], 3);

    let reply = get(app(), "/collections/catch/items?page=0", &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_item_membership_is_checked() {
    let reply = get(app(), "/collections/catch/items/201", &[]).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = get(app(), "/collections/river/items/201?_mediatype=application/json", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["isPartOf"], "http://localhost:5000/collections/river");
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let reply = get(app(), "/collections/lakes", &[]).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("lakes"));
}

#[tokio::test]
async fn test_geosp_page_has_navigation_triples() {
    let reply = get(app(), "/collections/catch/items?_profile=geosp&per_page=2&page=2", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("xhv:prev"));
    assert!(reply.body.contains("xhv:next"));
    assert!(reply.body.contains("ldp:Page"));
}

#[tokio::test]
async fn test_link_header_lists_alternates() {
    let reply = get(app(), "/collections/catch/items?page=1", &[]).await;
    assert!(reply.link.contains("rel=\"profile\""));
    assert!(reply.link.contains("token=\"geosp\""));
    assert!(reply
        .link
        .contains("/collections/catch/items?page=1&_profile=geosp&_mediatype=text%2Fturtle>; rel=\"alternate\""));
}

#[tokio::test]
async fn test_alt_profile() {
    let reply = get(app(), "/collections?_profile=alt&_mediatype=application/json", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    let tokens: Vec<String> = reply.json()["profiles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["token"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tokens, vec!["oai", "alt"]);
}

#[tokio::test]
async fn test_collections_list() {
    let reply = get(app(), "/collections?_mediatype=json", &[]).await;
    let body = reply.json();
    assert_eq!(body["numberMatched"], 2);
    assert_eq!(body["collections"][0]["featureCount"], counts::CATCH);
    assert_eq!(body["collections"][1]["featureCount"], counts::RIVER);
}

#[tokio::test]
async fn test_health_and_spec() {
    let reply = get(app(), "/health", &[]).await;
    assert_eq!(reply.json()["status"], "ok");

    let reply = get(app(), "/ready", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["store"], "memory");

    let reply = get(app(), "/spec", &[]).await;
    assert_eq!(reply.json()["openapi"], "3.0.3");
}

const AWKWARD_DATASET: &str = r#"
collections:
  - id: upper creek
    uri: http://store.example/collection/upper-creek
    title: Upper Creek
    description: |
      Catchments <img src=x onerror="alert(1)"> of **Upper Creek**.
    features:
      - id: "a#1"
        uri: http://store.example/upper-creek/a1
        title: Headwater
        description: <script>alert('x')</script>
        geometries:
          - crs: wgs84
            role: centroid
            coordinates: POINT (145.5 -37.5)
"#;

fn awkward_app() -> Router {
    app_with_store(Arc::new(MemoryStore::from_yaml_str(AWKWARD_DATASET).unwrap()))
}

#[tokio::test]
async fn test_html_descriptions_are_escaped() {
    let reply = get(
        awkward_app(),
        "/collections/upper%20creek/items/a%231",
        &[("accept", "text/html")],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.content_type.starts_with("text/html"));
    assert!(reply.body.contains("&lt;script&gt;"));
    assert!(!reply.body.contains("<script>alert"));

    let reply = get(
        awkward_app(),
        "/collections/upper%20creek",
        &[("accept", "text/html")],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("<strong>Upper Creek</strong>"));
    assert!(reply.body.contains("&lt;img"));
    assert!(!reply.body.contains("<img src=x"));
}

#[tokio::test]
async fn test_identifiers_are_encoded_in_links() {
    let reply = get(
        awkward_app(),
        "/collections/upper%20creek/items/a%231?_mediatype=application/json",
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    let self_href = body["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["rel"] == "self")
        .and_then(|l| l["href"].as_str())
        .unwrap()
        .to_string();
    assert!(self_href.ends_with("/collections/upper%20creek/items/a%231"));
    assert!(reply.link.contains("upper%20creek/items/a%231"));
}

#[tokio::test]
async fn test_collection_extent_from_dataset() {
    let reply = get(app(), "/collections/catch?_mediatype=application/json", &[]).await;
    let body = reply.json();
    assert_eq!(body["extent"]["spatial"]["bbox"][0][0], -180.0);
    assert!(body["extent"]["spatial"]["crs"]
        .as_str()
        .unwrap()
        .ends_with("CRS84"));
    assert_eq!(
        body["extent"]["temporal"]["interval"][0][0],
        "2012-01-01T00:00:00Z"
    );
    assert!(body["extent"]["temporal"]["interval"][0][1].is_null());

    let reply = get(app(), "/collections/river?_mediatype=application/json", &[]).await;
    assert!(reply.json().get("extent").is_none());
}

/// A store whose every query fails the way a broken endpoint would.
struct BrokenStore;

const SECRET_QUERY: &str = "SELECT ?secret WHERE { ?s ?p ?o }";

#[async_trait]
impl GraphStore for BrokenStore {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn dataset(&self) -> Result<Option<DatasetRecord>, QueryError> {
        Err(QueryError::Timeout)
    }

    async fn conformance_targets(&self) -> Result<Vec<ConformanceRecord>, QueryError> {
        Err(QueryError::Timeout)
    }

    async fn collections(&self) -> Result<Vec<ResourceRecord>, QueryError> {
        Err(QueryError::Timeout)
    }

    async fn lookup(
        &self,
        _identifier: &str,
        _kind: ResourceKind,
    ) -> Result<Vec<ResourceRecord>, QueryError> {
        Err(QueryError::Rejected {
            status: 400,
            message: format!("Parse error in {}", SECRET_QUERY),
        })
    }

    async fn scan(
        &self,
        _collection_uri: &str,
        _filter: Option<&BboxFilter>,
    ) -> Result<Vec<String>, QueryError> {
        Err(QueryError::Timeout)
    }

    async fn count(&self, _collection_uri: &str) -> Result<usize, QueryError> {
        Err(QueryError::Timeout)
    }

    async fn describe(&self, _uri: &str) -> Result<Option<FeatureRecord>, QueryError> {
        Err(QueryError::Timeout)
    }

    async fn ping(&self) -> Result<(), QueryError> {
        Err(QueryError::Transport("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_upstream_failure_is_generic_500() {
    let app = app_with_store(Arc::new(BrokenStore));
    let reply = get(app.clone(), "/collections/catch/items/101", &[]).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!reply.body.contains(SECRET_QUERY));
    assert!(!reply.body.contains("Parse error"));
    assert_eq!(reply.json()["status"], 500);

    let reply = get(app.clone(), "/ready", &[]).await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.json()["ready"], false);

    // Parameter checks still run before the store is touched.
    let reply = get(app, "/collections/catch/items?colour=red", &[]).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}
