//! In-memory RDF graphs.
//!
//! Entities build small graphs describing themselves; the graph is then
//! serialized into whichever RDF media type was negotiated. Triples are kept
//! in a sorted set so every serialization is deterministic.

mod serializer;

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::ApiError;
use crate::media::MediaType;

pub use serializer::{to_jsonld, to_ntriples, to_rdfxml, to_turtle};

/// Namespaces and terms used by the API's graphs.
pub mod vocab {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    pub const DCTERMS: &str = "http://purl.org/dc/terms/";
    pub const DCAT: &str = "http://www.w3.org/ns/dcat#";
    pub const GEO: &str = "http://www.opengis.net/ont/geosparql#";
    pub const GEOX: &str = "https://linked.data.gov.au/def/geox#";
    pub const GEOMETRY_ROLES: &str = "https://linked.data.gov.au/def/geometry-roles/";
    pub const LDP: &str = "http://www.w3.org/ns/ldp#";
    pub const XHV: &str = "https://www.w3.org/1999/xhtml/vocab#";
    pub const ALTR: &str = "http://www.w3.org/ns/dx/conneg/altr#";
    pub const PROF: &str = "http://www.w3.org/ns/dx/prof/";
    pub const OGCAPI: &str = "https://data.surroundaustralia.com/def/ogcapi/";

    /// Prefixes written by the Turtle, JSON-LD and RDF/XML serializers.
    pub const PREFIXES: &[(&str, &str)] = &[
        ("rdf", RDF),
        ("rdfs", RDFS),
        ("xsd", XSD),
        ("owl", OWL),
        ("dcterms", DCTERMS),
        ("dcat", DCAT),
        ("geo", GEO),
        ("geox", GEOX),
        ("role", GEOMETRY_ROLES),
        ("ldp", LDP),
        ("xhv", XHV),
        ("altr", ALTR),
        ("prof", PROF),
        ("ogcapi", OGCAPI),
    ];

    /// Join a namespace and a local name.
    pub fn iri(namespace: &str, local: &str) -> String {
        format!("{}{}", namespace, local)
    }

    pub fn rdf_type() -> String {
        iri(RDF, "type")
    }
}

/// An RDF literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

/// A node in a triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// A plain string literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: None,
            language: None,
        })
    }

    /// A literal with an explicit datatype IRI.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        })
    }

    /// A language-tagged literal.
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        })
    }

    /// An `xsd:integer` literal.
    pub fn integer(value: usize) -> Self {
        Term::typed(value.to_string(), vocab::iri(vocab::XSD, "integer"))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }
}

/// A subject-predicate-object statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

/// A set of triples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
    next_blank: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple. Duplicates are ignored.
    pub fn add(&mut self, subject: Term, predicate: impl Into<String>, object: Term) {
        self.triples.insert(Triple {
            subject,
            predicate: predicate.into(),
            object,
        });
    }

    /// Allocate a blank node unique within this graph.
    pub fn blank_node(&mut self) -> Term {
        let label = format!("b{}", self.next_blank);
        self.next_blank += 1;
        Term::Blank(label)
    }

    /// Move every triple of `other` into this graph, relabelling its blank
    /// nodes so they cannot collide with ours.
    pub fn merge(&mut self, other: Graph) {
        let mut relabelled: BTreeMap<String, Term> = BTreeMap::new();
        for triple in other.triples {
            let subject = self.relabel(triple.subject, &mut relabelled);
            let object = self.relabel(triple.object, &mut relabelled);
            self.add(subject, triple.predicate, object);
        }
    }

    fn relabel(&mut self, term: Term, relabelled: &mut BTreeMap<String, Term>) -> Term {
        match term {
            Term::Blank(label) => {
                if let Some(existing) = relabelled.get(&label) {
                    return existing.clone();
                }
                let fresh = self.blank_node();
                relabelled.insert(label, fresh.clone());
                fresh
            }
            other => other,
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Triples in subject, predicate, object order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn contains(&self, subject: &Term, predicate: &str, object: &Term) -> bool {
        self.triples.iter().any(|t| {
            &t.subject == subject && t.predicate == predicate && &t.object == object
        })
    }

    /// All objects for a subject and predicate.
    pub fn objects<'a>(&'a self, subject: &Term, predicate: &str) -> Vec<&'a Term> {
        self.triples
            .iter()
            .filter(|t| &t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
            .collect()
    }

    /// Serialize into the given RDF media type.
    ///
    /// `application/json` is treated as JSON-LD.
    pub fn serialize(&self, media_type: MediaType) -> Result<String, ApiError> {
        match media_type {
            MediaType::Turtle | MediaType::N3 => Ok(to_turtle(self)),
            MediaType::NTriples => Ok(to_ntriples(self)),
            MediaType::JsonLd | MediaType::Json => serde_json::to_string_pretty(&to_jsonld(self))
                .map_err(|e| ApiError::Internal(e.to_string())),
            MediaType::RdfXml => to_rdfxml(self),
            other => Err(ApiError::UnsupportedRepresentation(format!(
                "a graph cannot be serialized as {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::vocab::{iri, DCTERMS};
    use super::*;

    #[test]
    fn test_add_ignores_duplicates() {
        let mut g = Graph::new();
        let s = Term::iri("http://example.com/a");
        g.add(s.clone(), iri(DCTERMS, "title"), Term::literal("A"));
        g.add(s, iri(DCTERMS, "title"), Term::literal("A"));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_merge_relabels_blank_nodes() {
        let mut a = Graph::new();
        let b0 = a.blank_node();
        a.add(Term::iri("http://example.com/a"), "http://example.com/p", b0);

        let mut b = Graph::new();
        let other_b0 = b.blank_node();
        b.add(Term::iri("http://example.com/b"), "http://example.com/p", other_b0.clone());
        b.add(other_b0, "http://example.com/q", Term::literal("x"));

        a.merge(b);
        assert_eq!(a.len(), 3);

        let a_node = a.objects(&Term::iri("http://example.com/a"), "http://example.com/p")[0].clone();
        let b_node = a.objects(&Term::iri("http://example.com/b"), "http://example.com/p")[0].clone();
        assert_ne!(a_node, b_node);
        assert!(a.contains(&b_node, "http://example.com/q", &Term::literal("x")));
    }

    #[test]
    fn test_serialize_rejects_non_rdf_types() {
        let g = Graph::new();
        assert!(matches!(
            g.serialize(MediaType::Html),
            Err(ApiError::UnsupportedRepresentation(_))
        ));
        assert!(g.serialize(MediaType::Json).is_ok());
    }
}
