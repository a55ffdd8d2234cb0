//! Graph serializers: N-Triples, Turtle (also used for N3), JSON-LD and RDF/XML.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use super::vocab::{self, PREFIXES};
use super::{Graph, Literal, Term};
use crate::errors::ApiError;

/// Subject -> predicate -> objects, in sorted order.
type Grouped<'a> = BTreeMap<&'a Term, BTreeMap<&'a str, Vec<&'a Term>>>;

fn group(graph: &Graph) -> Grouped<'_> {
    let mut grouped: Grouped<'_> = BTreeMap::new();
    for triple in graph.iter() {
        grouped
            .entry(&triple.subject)
            .or_default()
            .entry(triple.predicate.as_str())
            .or_default()
            .push(&triple.object);
    }
    grouped
}

/// Predicates of one subject with `rdf:type` first.
fn ordered_predicates<'a>(
    predicates: &'a BTreeMap<&'a str, Vec<&'a Term>>,
) -> Vec<(&'a str, &'a Vec<&'a Term>)> {
    let rdf_type = vocab::rdf_type();
    let mut ordered: Vec<_> = predicates.iter().map(|(p, o)| (*p, o)).collect();
    ordered.sort_by_key(|(p, _)| *p != rdf_type);
    ordered
}

fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn is_plain_string(literal: &Literal) -> bool {
    match &literal.datatype {
        None => true,
        Some(datatype) => *datatype == vocab::iri(vocab::XSD, "string"),
    }
}

// ---------------------------------------------------------------------------
// N-Triples
// ---------------------------------------------------------------------------

fn nt_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => format!("<{}>", iri),
        Term::Blank(label) => format!("_:{}", label),
        Term::Literal(literal) => {
            let mut out = format!("\"{}\"", escape_string(&literal.value));
            if let Some(language) = &literal.language {
                out.push('@');
                out.push_str(language);
            } else if !is_plain_string(literal) {
                if let Some(datatype) = &literal.datatype {
                    out.push_str(&format!("^^<{}>", datatype));
                }
            }
            out
        }
    }
}

/// One statement per line, sorted.
pub fn to_ntriples(graph: &Graph) -> String {
    let mut out = String::new();
    for triple in graph.iter() {
        out.push_str(&format!(
            "{} <{}> {} .\n",
            nt_term(&triple.subject),
            triple.predicate,
            nt_term(&triple.object)
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Turtle
// ---------------------------------------------------------------------------

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn valid_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => chars.all(is_name_char),
        _ => false,
    }
}

/// Prefix and local name for an IRI, when one of the known prefixes covers it.
fn split_prefixed(iri: &str) -> Option<(&'static str, &str)> {
    PREFIXES.iter().find_map(|(prefix, namespace)| {
        iri.strip_prefix(namespace)
            .filter(|local| valid_local_name(local))
            .map(|local| (*prefix, local))
    })
}

fn turtle_iri(iri: &str, used: &mut BTreeSet<&'static str>) -> String {
    match split_prefixed(iri) {
        Some((prefix, local)) => {
            used.insert(prefix);
            format!("{}:{}", prefix, local)
        }
        None => format!("<{}>", iri),
    }
}

fn turtle_term(term: &Term, used: &mut BTreeSet<&'static str>) -> String {
    match term {
        Term::Iri(iri) => turtle_iri(iri, used),
        Term::Blank(label) => format!("_:{}", label),
        Term::Literal(literal) => {
            let mut out = format!("\"{}\"", escape_string(&literal.value));
            if let Some(language) = &literal.language {
                out.push('@');
                out.push_str(language);
            } else if !is_plain_string(literal) {
                if let Some(datatype) = &literal.datatype {
                    out.push_str("^^");
                    out.push_str(&turtle_iri(datatype, used));
                }
            }
            out
        }
    }
}

/// Prefixed, subject-grouped Turtle. Only prefixes that are used are declared.
pub fn to_turtle(graph: &Graph) -> String {
    let rdf_type = vocab::rdf_type();
    let mut used = BTreeSet::new();
    let mut body = String::new();

    for (subject, predicates) in group(graph) {
        body.push_str(&turtle_term(subject, &mut used));
        let ordered = ordered_predicates(&predicates);
        for (i, (predicate, objects)) in ordered.iter().enumerate() {
            let predicate = if *predicate == rdf_type {
                "a".to_string()
            } else {
                turtle_iri(predicate, &mut used)
            };
            let objects: Vec<String> = objects.iter().map(|o| turtle_term(o, &mut used)).collect();
            body.push_str(if i == 0 { " " } else { "    " });
            body.push_str(&predicate);
            body.push(' ');
            body.push_str(&objects.join(", "));
            body.push_str(if i + 1 == ordered.len() { " .\n\n" } else { " ;\n" });
        }
    }

    let mut out = String::new();
    for (prefix, namespace) in PREFIXES {
        if used.contains(prefix) {
            out.push_str(&format!("@prefix {}: <{}> .\n", prefix, namespace));
        }
    }
    if !used.is_empty() {
        out.push('\n');
    }
    out.push_str(&body);
    out
}

// ---------------------------------------------------------------------------
// JSON-LD
// ---------------------------------------------------------------------------

fn jsonld_id(term: &Term) -> String {
    match term {
        Term::Blank(label) => format!("_:{}", label),
        Term::Iri(iri) => iri.clone(),
        Term::Literal(literal) => literal.value.clone(),
    }
}

fn jsonld_object(term: &Term) -> Value {
    match term {
        Term::Literal(literal) => {
            let mut object = Map::new();
            object.insert("@value".to_string(), Value::String(literal.value.clone()));
            if let Some(language) = &literal.language {
                object.insert("@language".to_string(), Value::String(language.clone()));
            } else if !is_plain_string(literal) {
                if let Some(datatype) = &literal.datatype {
                    object.insert("@type".to_string(), Value::String(datatype.clone()));
                }
            }
            Value::Object(object)
        }
        other => json!({ "@id": jsonld_id(other) }),
    }
}

/// Expanded JSON-LD in `@graph` form, with the known prefixes as `@context`.
pub fn to_jsonld(graph: &Graph) -> Value {
    let rdf_type = vocab::rdf_type();
    let context: Map<String, Value> = PREFIXES
        .iter()
        .map(|(prefix, namespace)| (prefix.to_string(), Value::String(namespace.to_string())))
        .collect();

    let nodes: Vec<Value> = group(graph)
        .into_iter()
        .map(|(subject, predicates)| {
            let mut node = Map::new();
            node.insert("@id".to_string(), Value::String(jsonld_id(subject)));
            for (predicate, objects) in predicates {
                if predicate == rdf_type {
                    let types = objects.iter().map(|o| Value::String(jsonld_id(o))).collect();
                    node.insert("@type".to_string(), Value::Array(types));
                } else {
                    let values = objects.iter().map(|o| jsonld_object(o)).collect();
                    node.insert(predicate.to_string(), Value::Array(values));
                }
            }
            Value::Object(node)
        })
        .collect();

    json!({
        "@context": Value::Object(context),
        "@graph": nodes,
    })
}

// ---------------------------------------------------------------------------
// RDF/XML
// ---------------------------------------------------------------------------

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Splits a predicate IRI into a namespace and an XML local name.
fn xml_split(iri: &str) -> Option<(&str, &str)> {
    if let Some((prefix, local)) = split_prefixed(iri) {
        let namespace = PREFIXES.iter().find(|(p, _)| *p == prefix)?.1;
        return Some((namespace, local));
    }
    let cut = iri.rfind(|c: char| c == '#' || c == '/')? + 1;
    let (namespace, local) = iri.split_at(cut);
    valid_local_name(local).then_some((namespace, local))
}

/// `rdf:Description` per subject. Fails on predicates with no valid XML name.
pub fn to_rdfxml(graph: &Graph) -> Result<String, ApiError> {
    let mut namespaces: BTreeMap<String, String> = BTreeMap::new();
    namespaces.insert(vocab::RDF.to_string(), "rdf".to_string());
    let mut qname = |iri: &str| -> Result<String, ApiError> {
        let (namespace, local) = xml_split(iri).ok_or_else(|| {
            ApiError::UnsupportedRepresentation(format!(
                "the predicate <{}> has no RDF/XML form",
                iri
            ))
        })?;
        let known = PREFIXES.iter().find(|(_, ns)| *ns == namespace).map(|(p, _)| p.to_string());
        let next = format!("ns{}", namespaces.len());
        let prefix = namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| known.unwrap_or(next))
            .clone();
        Ok(format!("{}:{}", prefix, local))
    };

    let mut body = String::new();
    for (subject, predicates) in group(graph) {
        match subject {
            Term::Blank(label) => {
                body.push_str(&format!("  <rdf:Description rdf:nodeID=\"{}\">\n", escape_xml(label)))
            }
            other => body.push_str(&format!(
                "  <rdf:Description rdf:about=\"{}\">\n",
                escape_xml(&jsonld_id(other))
            )),
        }
        for (predicate, objects) in ordered_predicates(&predicates) {
            let name = qname(predicate)?;
            for object in objects {
                match object {
                    Term::Iri(iri) => body.push_str(&format!(
                        "    <{} rdf:resource=\"{}\"/>\n",
                        name,
                        escape_xml(iri)
                    )),
                    Term::Blank(label) => body.push_str(&format!(
                        "    <{} rdf:nodeID=\"{}\"/>\n",
                        name,
                        escape_xml(label)
                    )),
                    Term::Literal(literal) => {
                        let mut attributes = String::new();
                        if let Some(language) = &literal.language {
                            attributes.push_str(&format!(" xml:lang=\"{}\"", escape_xml(language)));
                        } else if !is_plain_string(literal) {
                            if let Some(datatype) = &literal.datatype {
                                attributes.push_str(&format!(
                                    " rdf:datatype=\"{}\"",
                                    escape_xml(datatype)
                                ));
                            }
                        }
                        body.push_str(&format!(
                            "    <{}{}>{}</{}>\n",
                            name,
                            attributes,
                            escape_xml(&literal.value),
                            name
                        ));
                    }
                }
            }
        }
        body.push_str("  </rdf:Description>\n");
    }

    let mut declarations: Vec<(String, String)> = namespaces
        .into_iter()
        .map(|(namespace, prefix)| (prefix, namespace))
        .collect();
    declarations.sort();

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<rdf:RDF");
    for (prefix, namespace) in declarations {
        out.push_str(&format!("\n   xmlns:{}=\"{}\"", prefix, escape_xml(&namespace)));
    }
    out.push_str(">\n");
    out.push_str(&body);
    out.push_str("</rdf:RDF>\n");
    Ok(out)
}
