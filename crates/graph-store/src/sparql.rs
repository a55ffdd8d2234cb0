//! SPARQL 1.1 protocol client.
//!
//! Queries are POSTed as `application/sparql-query` and answered as
//! `application/sparql-results+json`. The query text is built by the pure
//! functions in [`queries`] so it can be inspected in tests.

use async_trait::async_trait;
use features_protocol::{BboxFilter, Crs, Geometry, GeometryRole};
use metrics::{counter, histogram};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::error::QueryError;
use crate::records::{ConformanceRecord, DatasetRecord, FeatureRecord, ResourceKind, ResourceRecord};
use crate::retry::RetryPolicy;
use crate::store::GraphStore;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Longest slice of an error body kept in [`QueryError::Rejected`].
const MAX_ERROR_BODY: usize = 512;

/// A graph store reached over the SPARQL protocol.
pub struct SparqlStore {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl SparqlStore {
    /// Create a store for `endpoint`. `timeout` bounds each query.
    pub fn new(endpoint: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| QueryError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a SELECT query and return its rows.
    async fn select(&self, label: &'static str, query: &str) -> Result<Vec<Row>, QueryError> {
        let response = self.query(label, query).await?;
        let results = response
            .results
            .ok_or_else(|| QueryError::InvalidResponse("SELECT response without results".into()))?;
        Ok(results.bindings.into_iter().map(Row::from).collect())
    }

    /// Send one query with retries, recording latency and failures.
    async fn query(&self, label: &'static str, query: &str) -> Result<SparqlResponse, QueryError> {
        let start = Instant::now();
        let result = self.retry.run(label, || self.execute(query)).await;
        histogram!("graph_store_query_duration_seconds", "query" => label)
            .record(start.elapsed().as_secs_f64());
        if result.is_err() {
            counter!("graph_store_query_errors_total", "query" => label).increment(1);
        }
        result
    }

    async fn execute(&self, query: &str) -> Result<SparqlResponse, QueryError> {
        debug!(endpoint = %self.endpoint, query_len = query.len(), "Sending SPARQL query");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, SPARQL_QUERY)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .body(query.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(QueryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| QueryError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl GraphStore for SparqlStore {
    fn name(&self) -> &'static str {
        "sparql"
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn dataset(&self) -> Result<Option<DatasetRecord>, QueryError> {
        let rows = self.select("dataset", &queries::dataset()).await?;
        Ok(rows.first().and_then(|row| {
            Some(DatasetRecord {
                uri: row.get("d")?.to_string(),
                title: row.get_owned("title"),
                description: row.get_owned("description"),
            })
        }))
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn conformance_targets(&self) -> Result<Vec<ConformanceRecord>, QueryError> {
        let rows = self.select("conformance", &queries::conformance()).await?;
        let mut records: Vec<ConformanceRecord> = Vec::new();
        for row in rows {
            let Some(uri) = row.get("c") else { continue };
            if records.iter().any(|r| r.uri == uri) {
                continue;
            }
            records.push(ConformanceRecord {
                uri: uri.to_string(),
                title: row.get_owned("title"),
            });
        }
        Ok(records)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn collections(&self) -> Result<Vec<ResourceRecord>, QueryError> {
        let rows = self.select("collections", &queries::collections()).await?;
        Ok(resource_records(rows))
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint, kind = kind.as_str()))]
    async fn lookup(
        &self,
        identifier: &str,
        kind: ResourceKind,
    ) -> Result<Vec<ResourceRecord>, QueryError> {
        let rows = self.select("lookup", &queries::lookup(identifier, kind)).await?;
        Ok(resource_records(rows))
    }

    #[instrument(skip(self, filter), fields(endpoint = %self.endpoint, filter = filter.map(|f| f.kind_name())))]
    async fn scan(
        &self,
        collection_uri: &str,
        filter: Option<&BboxFilter>,
    ) -> Result<Vec<String>, QueryError> {
        let rows = self.select("scan", &queries::scan(collection_uri, filter)).await?;
        let mut uris: Vec<String> = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(uri) = row.get("f") {
                if !uris.iter().any(|u| u == uri) {
                    uris.push(uri.to_string());
                }
            }
        }
        debug!(count = uris.len(), "Scanned collection members");
        Ok(uris)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn count(&self, collection_uri: &str) -> Result<usize, QueryError> {
        let rows = self.select("count", &queries::count(collection_uri)).await?;
        let raw = rows
            .first()
            .and_then(|row| row.get("count"))
            .ok_or_else(|| QueryError::InvalidResponse("COUNT query returned no rows".into()))?;
        raw.parse::<usize>()
            .map_err(|_| QueryError::InvalidResponse(format!("non-numeric count '{}'", raw)))
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn describe(&self, uri: &str) -> Result<Option<FeatureRecord>, QueryError> {
        let rows = self.select("describe", &queries::describe(uri)).await?;
        Ok(feature_record(uri, &rows))
    }

    async fn ping(&self) -> Result<(), QueryError> {
        let response = self.query("ping", queries::PING).await?;
        match response.boolean {
            Some(_) => Ok(()),
            None => Err(QueryError::InvalidResponse("ASK response without boolean".into())),
        }
    }
}

/// A SPARQL JSON results document (SELECT or ASK).
#[derive(Debug, Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    results: Option<SparqlResults>,
    #[serde(default)]
    boolean: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// One solution, reduced to variable name → lexical value.
#[derive(Debug, Clone, Default)]
struct Row(HashMap<String, String>);

impl Row {
    fn get(&self, var: &str) -> Option<&str> {
        self.0.get(var).map(String::as_str)
    }

    fn get_owned(&self, var: &str) -> Option<String> {
        self.get(var).map(str::to_string)
    }
}

impl From<HashMap<String, SparqlValue>> for Row {
    fn from(binding: HashMap<String, SparqlValue>) -> Self {
        Row(binding.into_iter().map(|(k, v)| (k, v.value)).collect())
    }
}

/// Collapse `?r ?id ?title ?description ?collection` rows into one record
/// per resource, keeping row order. Every `?collection` seen for a resource
/// is kept.
fn resource_records(rows: Vec<Row>) -> Vec<ResourceRecord> {
    let mut records: Vec<ResourceRecord> = Vec::new();
    for row in rows {
        let (Some(uri), Some(identifier)) = (row.get("r"), row.get("id")) else {
            continue;
        };
        let record = match records.iter().position(|r| r.uri == uri) {
            Some(index) => &mut records[index],
            None => {
                records.push(ResourceRecord {
                    uri: uri.to_string(),
                    identifier: identifier.to_string(),
                    title: row.get_owned("title"),
                    description: row.get_owned("description"),
                    is_part_of: Vec::new(),
                    extent: None,
                });
                let last = records.len() - 1;
                &mut records[last]
            }
        };
        add_collection(&mut record.is_part_of, &row);
    }
    records
}

fn add_collection(is_part_of: &mut Vec<String>, row: &Row) {
    if let Some(collection) = row.get("collection") {
        if !is_part_of.iter().any(|c| c == collection) {
            is_part_of.push(collection.to_string());
        }
    }
}

fn feature_record(uri: &str, rows: &[Row]) -> Option<FeatureRecord> {
    let first = rows.iter().find(|row| row.get("id").is_some())?;

    let mut is_part_of = Vec::new();
    for row in rows {
        add_collection(&mut is_part_of, row);
    }

    // One entry per geometry node, in first-seen order.
    let mut nodes: Vec<(String, Vec<Geometry>)> = Vec::new();
    for row in rows {
        let Some(node) = row.get("g") else { continue };
        let role = row
            .get("role")
            .and_then(GeometryRole::parse)
            .unwrap_or_default();
        let label = row.get_owned("glabel");

        let mut found = Vec::new();
        if let Some(wkt) = row.get("wkt") {
            found.push(Geometry::new(wkt, role, Crs::Wgs84));
        }
        if let Some(dggs) = row.get("dggs") {
            found.push(Geometry::new(dggs, role, Crs::Dggs));
        }
        for mut geometry in found {
            geometry.label = label.clone();
            match nodes.iter_mut().find(|(n, _)| n == node) {
                Some((_, geometries)) => {
                    if !geometries.contains(&geometry) {
                        geometries.push(geometry);
                    }
                }
                None => nodes.push((node.to_string(), vec![geometry])),
            }
        }
    }

    Some(FeatureRecord {
        uri: uri.to_string(),
        identifier: first.get("id")?.to_string(),
        title: first.get_owned("title"),
        description: first.get_owned("description"),
        is_part_of,
        geometries: nodes.into_iter().flat_map(|(_, g)| g).collect(),
    })
}

/// Query text builders.
pub mod queries {
    use features_protocol::rdf::vocab::{DCAT, DCTERMS, GEO, GEOX, OGCAPI, RDFS};
    use features_protocol::{BboxFilter, Crs};

    use crate::records::ResourceKind;

    const GEOF: &str = "http://www.opengis.net/def/function/geosparql/";

    pub const PING: &str = "ASK { ?s ?p ?o }";

    /// Classes a feature may be typed with.
    const FEATURE_TYPES: &str = "VALUES ?type { geo:Feature ogcapi:Feature }";

    /// Classes a collection may be typed with.
    const COLLECTION_TYPES: &str = "VALUES ?type { geo:FeatureCollection ogcapi:Collection }";

    fn prefixes() -> String {
        [
            ("dcterms", DCTERMS),
            ("dcat", DCAT),
            ("geo", GEO),
            ("geof", GEOF),
            ("geox", GEOX),
            ("ogcapi", OGCAPI),
            ("rdfs", RDFS),
        ]
        .iter()
        .map(|(prefix, ns)| format!("PREFIX {}: <{}>\n", prefix, ns))
        .collect()
    }

    /// Write `value` as a quoted SPARQL string literal.
    pub fn literal(value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('"');
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        }
        out.push('"');
        out
    }

    /// Write `uri` as an IRI reference, percent-encoding characters IRIs forbid.
    pub fn iri_ref(uri: &str) -> String {
        let mut out = String::with_capacity(uri.len() + 2);
        out.push('<');
        for c in uri.chars() {
            if c.is_control() || c == ' ' || "<>\"{}|^`\\".contains(c) {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            } else {
                out.push(c);
            }
        }
        out.push('>');
        out
    }

    pub fn dataset() -> String {
        format!(
            "{}SELECT ?d ?title ?description WHERE {{\n  \
             ?d a dcat:Dataset .\n  \
             OPTIONAL {{ ?d dcterms:title ?title }}\n  \
             OPTIONAL {{ ?d dcterms:description ?description }}\n\
             }}\nORDER BY ?d\nLIMIT 1",
            prefixes()
        )
    }

    pub fn conformance() -> String {
        format!(
            "{}SELECT ?c ?title WHERE {{\n  \
             ?c a ogcapi:ConformanceTarget .\n  \
             OPTIONAL {{ ?c dcterms:title ?title }}\n\
             }}\nORDER BY ?c",
            prefixes()
        )
    }

    /// Resources matching `pattern`, one row per `dcterms:isPartOf` value.
    fn resources(pattern: &str) -> String {
        format!(
            "{}SELECT ?r ?id ?title ?description ?collection WHERE {{\n  \
             {}\n  \
             ?r dcterms:identifier ?id .\n  \
             OPTIONAL {{ ?r dcterms:title ?title }}\n  \
             OPTIONAL {{ ?r dcterms:description ?description }}\n  \
             OPTIONAL {{ ?r dcterms:isPartOf ?collection }}\n\
             }}\nORDER BY ?id ?r",
            prefixes(),
            pattern
        )
    }

    pub fn collections() -> String {
        resources(&format!("{}\n  ?r a ?type .", COLLECTION_TYPES))
    }

    /// Resources carrying `identifier`, whatever their `rdf:type`.
    ///
    /// A feature is anything that is part of something. A collection is
    /// anything typed as one or having members.
    pub fn lookup(identifier: &str, kind: ResourceKind) -> String {
        let membership = match kind {
            ResourceKind::Collection => format!(
                "FILTER (EXISTS {{ ?r a ?type . {} }} || EXISTS {{ ?member dcterms:isPartOf ?r }})",
                COLLECTION_TYPES
            ),
            ResourceKind::Feature => "FILTER EXISTS { ?r dcterms:isPartOf ?parent }".to_string(),
        };
        resources(&format!(
            "FILTER (STR(?id) = {})\n  {}",
            literal(identifier),
            membership
        ))
    }

    pub fn count(collection_uri: &str) -> String {
        format!(
            "{}SELECT (COUNT(DISTINCT ?f) AS ?count) WHERE {{\n  \
             {}\n  \
             ?f a ?type ;\n     dcterms:isPartOf {} .\n\
             }}",
            prefixes(),
            FEATURE_TYPES,
            iri_ref(collection_uri)
        )
    }

    /// Member URIs of a collection, optionally restricted by a bbox filter.
    pub fn scan(collection_uri: &str, filter: Option<&BboxFilter>) -> String {
        let restriction = match filter {
            None => String::new(),
            Some(f @ BboxFilter::Coords { .. }) => format!(
                "  ?f geo:hasGeometry ?g .\n  ?g geo:asWKT ?wkt .\n  \
                 FILTER (geof:sfIntersects(?wkt, {}^^geo:wktLiteral))\n",
                literal(&bbox_wkt(f))
            ),
            Some(f) => {
                let tests: Vec<String> = f
                    .cell_tokens()
                    .iter()
                    .map(|token| format!("CONTAINS(STR(?dggs), {})", literal(token)))
                    .collect();
                format!(
                    "  ?f geo:hasGeometry ?g .\n  ?g geox:asDGGS ?dggs .\n  FILTER ({})\n",
                    tests.join(" || ")
                )
            }
        };
        format!(
            "{}SELECT DISTINCT ?f ?id WHERE {{\n  \
             {}\n  \
             ?f a ?type ;\n     dcterms:isPartOf {} ;\n     dcterms:identifier ?id .\n\
             {}}}\nORDER BY ?id ?f",
            prefixes(),
            FEATURE_TYPES,
            iri_ref(collection_uri),
            restriction
        )
    }

    /// Attributes and geometries of one feature, one row per geometry literal.
    pub fn describe(uri: &str) -> String {
        let subject = iri_ref(uri);
        format!(
            "{p}SELECT ?id ?title ?description ?collection ?g ?role ?glabel ?wkt ?dggs WHERE {{\n  \
             {s} dcterms:identifier ?id .\n  \
             OPTIONAL {{ {s} dcterms:title ?title }}\n  \
             OPTIONAL {{ {s} dcterms:description ?description }}\n  \
             OPTIONAL {{ {s} dcterms:isPartOf ?collection }}\n  \
             OPTIONAL {{\n    {s} geo:hasGeometry ?g .\n    \
             OPTIONAL {{ ?g geox:hasRole ?role }}\n    \
             OPTIONAL {{ ?g rdfs:label ?glabel }}\n    \
             OPTIONAL {{ ?g geo:asWKT ?wkt }}\n    \
             OPTIONAL {{ ?g geox:asDGGS ?dggs }}\n  \
             }}\n\
             }}",
            p = prefixes(),
            s = subject
        )
    }

    /// The coordinate box as a CRS84 WKT literal; a MULTIPOLYGON when it
    /// crosses the antimeridian.
    pub fn bbox_wkt(filter: &BboxFilter) -> String {
        let rings: Vec<String> = filter
            .rectangles()
            .iter()
            .map(|r| {
                let (min, max) = (r.min(), r.max());
                format!(
                    "(({w} {s}, {e} {s}, {e} {n}, {w} {n}, {w} {s}))",
                    w = min.x,
                    s = min.y,
                    e = max.x,
                    n = max.y
                )
            })
            .collect();
        let shape = if rings.len() == 1 {
            format!("POLYGON {}", rings[0])
        } else {
            format!("MULTIPOLYGON ({})", rings.join(", "))
        };
        format!("<{}> {}", Crs::Wgs84.uri(), shape)
    }
}
