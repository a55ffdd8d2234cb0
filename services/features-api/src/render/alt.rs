//! The alternate representations (`alt`) profile.
//!
//! Lists every profile a resource declares and the URL of each of its
//! media types.

use serde_json::{json, Value};

use features_protocol::rdf::vocab::{iri, rdf_type, ALTR, DCTERMS, PROF, RDFS};
use features_protocol::rdf::Term;
use features_protocol::Graph;

use crate::negotiation::alternate_href;
use crate::render::RenderContext;

pub fn to_json(ctx: &RenderContext<'_>) -> Value {
    let profiles: Vec<Value> = ctx
        .resource
        .profiles
        .iter()
        .map(|profile| {
            let representations: Vec<Value> = profile
                .media_types
                .iter()
                .map(|media_type| {
                    json!({
                        "mediaType": media_type,
                        "label": media_type.label(),
                        "href": alternate_href(ctx.self_url, ctx.params, profile.token, *media_type),
                    })
                })
                .collect();
            json!({
                "token": profile.token,
                "uri": profile.uri,
                "label": profile.label,
                "comment": profile.comment,
                "default": profile.token == ctx.resource.default_token,
                "defaultMediaType": profile.default_media_type,
                "representations": representations,
            })
        })
        .collect();

    json!({
        "uri": ctx.resource_url(),
        "defaultProfile": ctx.resource.default_token,
        "profiles": profiles,
    })
}

/// The resource with one `altr:Representation` per (profile, media type).
pub fn to_graph(ctx: &RenderContext<'_>) -> Graph {
    let mut g = Graph::new();
    let me = Term::iri(ctx.resource_url());

    for profile in &ctx.resource.profiles {
        let profile_term = Term::iri(profile.uri);
        g.add(profile_term.clone(), rdf_type(), Term::iri(iri(PROF, "Profile")));
        g.add(profile_term.clone(), iri(RDFS, "label"), Term::literal(profile.label));
        g.add(profile_term.clone(), iri(PROF, "hasToken"), Term::literal(profile.token));

        for media_type in &profile.media_types {
            let href = alternate_href(ctx.self_url, ctx.params, profile.token, *media_type);
            let rep = Term::iri(href);
            g.add(me.clone(), iri(ALTR, "hasRepresentation"), rep.clone());
            g.add(rep.clone(), rdf_type(), Term::iri(iri(ALTR, "Representation")));
            g.add(rep.clone(), iri(DCTERMS, "conformsTo"), profile_term.clone());
            g.add(rep.clone(), iri(DCTERMS, "format"), Term::literal(media_type.as_str()));
            if profile.token == ctx.resource.default_token
                && *media_type == profile.default_media_type
            {
                g.add(me.clone(), iri(ALTR, "hasDefaultRepresentation"), rep);
            }
        }
    }
    g
}
