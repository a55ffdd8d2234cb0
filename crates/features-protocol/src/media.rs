//! Media types served by the API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A serialization format a resource can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "text/html")]
    Html,
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "application/geo+json")]
    GeoJson,
    #[serde(rename = "text/turtle")]
    Turtle,
    #[serde(rename = "application/rdf+xml")]
    RdfXml,
    #[serde(rename = "application/ld+json")]
    JsonLd,
    #[serde(rename = "text/n3")]
    N3,
    #[serde(rename = "application/n-triples")]
    NTriples,
    #[serde(rename = "application/vnd.oai.openapi+json;version=3.0")]
    OpenApi,
}

/// Media types every RDF-capable profile accepts.
///
/// `application/json` is served as JSON-LD when the active profile is an RDF one.
pub const RDF_MEDIA_TYPES: &[MediaType] = &[
    MediaType::Turtle,
    MediaType::RdfXml,
    MediaType::JsonLd,
    MediaType::N3,
    MediaType::NTriples,
    MediaType::Json,
];

impl MediaType {
    /// The canonical media type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Html => "text/html",
            MediaType::Json => "application/json",
            MediaType::GeoJson => "application/geo+json",
            MediaType::Turtle => "text/turtle",
            MediaType::RdfXml => "application/rdf+xml",
            MediaType::JsonLd => "application/ld+json",
            MediaType::N3 => "text/n3",
            MediaType::NTriples => "application/n-triples",
            MediaType::OpenApi => "application/vnd.oai.openapi+json;version=3.0",
        }
    }

    /// Human-readable name, used for alternate links and HTML listings.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Html => "HTML",
            MediaType::Json => "JSON",
            MediaType::GeoJson => "GeoJSON",
            MediaType::Turtle => "Turtle",
            MediaType::RdfXml => "RDF/XML",
            MediaType::JsonLd => "JSON-LD",
            MediaType::N3 => "Notation-3",
            MediaType::NTriples => "N-Triples",
            MediaType::OpenApi => "OpenAPI 3.0",
        }
    }

    /// Parse a media type as found in an `Accept` header or `Content-Type`.
    ///
    /// Parameters (`;charset=...`) are ignored and matching is case-insensitive.
    pub fn from_media_type(s: &str) -> Option<Self> {
        let essence = s.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "text/html" | "application/xhtml+xml" => Some(MediaType::Html),
            "application/json" => Some(MediaType::Json),
            "application/geo+json" => Some(MediaType::GeoJson),
            "text/turtle" => Some(MediaType::Turtle),
            "application/rdf+xml" => Some(MediaType::RdfXml),
            "application/ld+json" => Some(MediaType::JsonLd),
            "text/n3" => Some(MediaType::N3),
            "application/n-triples" => Some(MediaType::NTriples),
            "application/vnd.oai.openapi+json" => Some(MediaType::OpenApi),
            _ => None,
        }
    }

    /// Parse the `_mediatype` / `_format` query parameter value.
    ///
    /// Accepts full media types as well as short aliases. A literal `+` in an
    /// unencoded query string arrives as a space, so spaces are read as `+`.
    pub fn from_query_param(s: &str) -> Option<Self> {
        let s = s.trim().replace(' ', "+");
        match s.to_lowercase().as_str() {
            "html" => Some(MediaType::Html),
            "json" => Some(MediaType::Json),
            "geojson" | "geo+json" => Some(MediaType::GeoJson),
            "turtle" | "ttl" => Some(MediaType::Turtle),
            "xml" | "rdf" | "rdfxml" | "rdf+xml" => Some(MediaType::RdfXml),
            "jsonld" | "json-ld" | "ld+json" => Some(MediaType::JsonLd),
            "n3" => Some(MediaType::N3),
            "nt" | "ntriples" | "n-triples" => Some(MediaType::NTriples),
            other => Self::from_media_type(other),
        }
    }

    /// Whether this is one of the RDF serializations.
    pub fn is_rdf(&self) -> bool {
        matches!(
            self,
            MediaType::Turtle
                | MediaType::RdfXml
                | MediaType::JsonLd
                | MediaType::N3
                | MediaType::NTriples
        )
    }

    /// Top-level type (`text`, `application`), used for `type/*` ranges.
    pub fn top_level(&self) -> &'static str {
        self.as_str().split('/').next().unwrap_or("")
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_media_type_ignores_parameters() {
        assert_eq!(
            MediaType::from_media_type("text/turtle; charset=utf-8"),
            Some(MediaType::Turtle)
        );
        assert_eq!(
            MediaType::from_media_type("Application/JSON"),
            Some(MediaType::Json)
        );
        assert_eq!(MediaType::from_media_type("image/png"), None);
    }

    #[test]
    fn test_from_query_param_aliases() {
        assert_eq!(MediaType::from_query_param("geojson"), Some(MediaType::GeoJson));
        assert_eq!(MediaType::from_query_param("ttl"), Some(MediaType::Turtle));
        assert_eq!(
            MediaType::from_query_param("application/n-triples"),
            Some(MediaType::NTriples)
        );
        assert_eq!(MediaType::from_query_param("csv"), None);
    }

    #[test]
    fn test_from_query_param_plus_decoded_as_space() {
        assert_eq!(
            MediaType::from_query_param("application/ld json"),
            Some(MediaType::JsonLd)
        );
    }

    #[test]
    fn test_rdf_set() {
        assert!(RDF_MEDIA_TYPES.contains(&MediaType::Json));
        assert!(!MediaType::Json.is_rdf());
        assert!(MediaType::N3.is_rdf());
        assert_eq!(MediaType::Turtle.top_level(), "text");
    }

    #[test]
    fn test_serialize_as_string() {
        let json = serde_json::to_string(&MediaType::GeoJson).unwrap();
        assert_eq!(json, "\"application/geo+json\"");
    }
}
