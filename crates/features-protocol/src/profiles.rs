//! Representation profiles.
//!
//! A profile is a named representation contract, independent of the
//! serialization format. Each resource declares the profiles it supports and
//! a default token.

use serde::Serialize;

use crate::media::{MediaType, RDF_MEDIA_TYPES};

/// Token of the OGC API (plain API view) profile.
pub const OAI: &str = "oai";
/// Token of the GeoSPARQL profile.
pub const GEOSP: &str = "geosp";
/// Token of the DCAT profile.
pub const DCAT: &str = "dcat";
/// Token of the alternate representations profile.
pub const ALT: &str = "alt";

/// A named representation contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    /// Short token used in `_profile` and `Accept-Profile`.
    pub token: &'static str,

    /// Canonical URI of the profile.
    pub uri: &'static str,

    /// Human-readable label.
    pub label: &'static str,

    /// Short description.
    pub comment: &'static str,

    /// Media types this profile can be rendered in, in preference order.
    pub media_types: Vec<MediaType>,

    /// Media type used when negotiation yields no match.
    pub default_media_type: MediaType,
}

impl Profile {
    /// The OGC API Features profile over the given media types.
    ///
    /// The default media type is HTML when listed, otherwise the first type.
    pub fn oai(media_types: &[MediaType]) -> Self {
        let default_media_type = if media_types.contains(&MediaType::Html) {
            MediaType::Html
        } else {
            media_types.first().copied().unwrap_or(MediaType::Json)
        };
        Self {
            token: OAI,
            uri: "http://www.opengis.net/def/spec/ogcapi-features-1/1.0/req/oas30",
            label: "OGC API Features",
            comment: "The OGC API Features specification's view of resources, as JSON, GeoJSON or HTML",
            media_types: media_types.to_vec(),
            default_media_type,
        }
    }

    /// The GeoSPARQL profile: HTML plus every RDF serialization.
    pub fn geosp() -> Self {
        Self {
            token: GEOSP,
            uri: "http://www.opengis.net/ont/geosparql",
            label: "GeoSPARQL",
            comment: "Features and their geometries described using the GeoSPARQL 1.1 ontology",
            media_types: rdf_media_types(),
            default_media_type: MediaType::Turtle,
        }
    }

    /// The DCAT profile: HTML plus every RDF serialization.
    pub fn dcat() -> Self {
        Self {
            token: DCAT,
            uri: "https://www.w3.org/TR/vocab-dcat/",
            label: "DCAT",
            comment: "The dataset described using the Data Catalog Vocabulary",
            media_types: rdf_media_types(),
            default_media_type: MediaType::Turtle,
        }
    }

    /// The alternate representations profile, available on every resource.
    pub fn alt() -> Self {
        Self {
            token: ALT,
            uri: "http://www.w3.org/ns/dx/conneg/altr",
            label: "Alternate Representations",
            comment: "Lists the profiles and media types this resource is available in",
            media_types: rdf_media_types(),
            default_media_type: MediaType::Html,
        }
    }

    /// Whether the profile renders RDF graphs for non-HTML media types.
    pub fn is_rdf(&self) -> bool {
        self.media_types.iter().any(MediaType::is_rdf)
    }

    /// Whether the profile supports a media type.
    pub fn supports(&self, media_type: MediaType) -> bool {
        self.media_types.contains(&media_type)
    }
}

fn rdf_media_types() -> Vec<MediaType> {
    let mut types = vec![MediaType::Html];
    types.extend_from_slice(RDF_MEDIA_TYPES);
    types
}
