//! Core types used across the API.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::media::MediaType;

/// Link relation types used by this API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelType {
    #[serde(rename = "self")]
    Self_,
    Alternate,
    Items,
    ServiceDesc,
    ServiceDoc,
    Conformance,
    Data,
    Collection,
    Root,
    First,
    Last,
    Prev,
    Next,
    Profile,
    /// `rdf:type` of the link target, as used for `prof:Profile` entries.
    Type,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::Self_ => "self",
            RelType::Alternate => "alternate",
            RelType::Items => "items",
            RelType::ServiceDesc => "service-desc",
            RelType::ServiceDoc => "service-doc",
            RelType::Conformance => "conformance",
            RelType::Data => "data",
            RelType::Collection => "collection",
            RelType::Root => "root",
            RelType::First => "first",
            RelType::Last => "last",
            RelType::Prev => "prev",
            RelType::Next => "next",
            RelType::Profile => "profile",
            RelType::Type => "type",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language of a linked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrefLang {
    #[serde(rename = "en")]
    En,
}

impl HrefLang {
    pub fn as_str(&self) -> &'static str {
        match self {
            HrefLang::En => "en",
        }
    }
}

/// A hyperlink to a related resource.
///
/// Links are value objects built fresh for every response. They render both
/// as JSON objects and as RFC 8288 `Link` header values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// The URI of the linked resource.
    pub href: String,

    /// The relationship type.
    pub rel: RelType,

    /// The media type of the linked resource.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<MediaType>,

    /// The language of the linked resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<HrefLang>,

    /// A human-readable title for the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Create a new link with required fields.
    pub fn new(href: impl Into<String>, rel: RelType) -> Self {
        Self {
            href: href.into(),
            rel,
            type_: None,
            hreflang: None,
            title: None,
        }
    }

    /// Set the media type.
    pub fn with_type(mut self, type_: MediaType) -> Self {
        self.type_ = Some(type_);
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the language.
    pub fn with_hreflang(mut self, hreflang: HrefLang) -> Self {
        self.hreflang = Some(hreflang);
        self
    }

    /// Render as a single `Link` header entry.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("<{}>; rel=\"{}\"", self.href, self.rel);
        if let Some(type_) = self.type_ {
            out.push_str(&format!("; type=\"{}\"", type_));
        }
        if let Some(hreflang) = self.hreflang {
            out.push_str(&format!("; hreflang=\"{}\"", hreflang.as_str()));
        }
        if let Some(title) = &self.title {
            out.push_str(&format!("; title=\"{}\"", title.replace('"', "'")));
        }
        out
    }
}

/// Percent-encode an identifier for use as one URL path segment.
pub fn path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// The spatial and temporal extent of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Extent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialExtent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalExtent>,
}

/// Spatial extent with bounding box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpatialExtent {
    /// Bounding boxes as [west, south, east, north] arrays.
    pub bbox: Vec<Vec<f64>>,

    #[serde(default = "default_crs")]
    pub crs: String,
}

fn default_crs() -> String {
    "http://www.opengis.net/def/crs/OGC/1.3/CRS84".to_string()
}

/// Temporal extent with time intervals (ISO 8601, null for open ends).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemporalExtent {
    pub interval: Vec<Vec<Option<String>>>,
}
