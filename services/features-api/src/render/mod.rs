//! Renderer dispatch.
//!
//! Each resource type has a [`RenderTable`] mapping `(profile token, media
//! type)` to a serializer. Tables are checked against the resource's declared
//! profiles at startup, so a request can only miss the table if the entity
//! itself cannot be rendered.

pub mod alt;
pub mod html;
pub mod tables;

use std::collections::HashMap;

use serde_json::{json, Value};

use features_protocol::media::RDF_MEDIA_TYPES;
use features_protocol::profiles::ALT;
use features_protocol::{ApiError, Graph, Link, MediaType};

use crate::negotiation::{Negotiated, ResourceProfiles};

pub use html::{BasicHtml, HtmlTemplates};
pub use tables::Renderers;

/// Everything a serializer may need besides the entity.
pub struct RenderContext<'a> {
    pub resource: &'a ResourceProfiles,
    pub negotiated: &'a Negotiated,
    /// The full request URL.
    pub self_url: &'a str,
    pub params: &'a [(String, String)],
    pub api_title: &'a str,
    pub base_url: &'a str,
    pub html: &'a dyn HtmlTemplates,
}

impl RenderContext<'_> {
    /// The request URL without its query string.
    pub fn resource_url(&self) -> &str {
        self.self_url.split('?').next().unwrap_or(self.self_url)
    }
}

/// A serialized response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub body: String,
    pub media_type: MediaType,
}

impl Rendered {
    pub fn new(body: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            body: body.into(),
            media_type,
        }
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> String {
        match self.media_type {
            MediaType::Html => "text/html; charset=utf-8".to_string(),
            MediaType::Turtle | MediaType::N3 => format!("{}; charset=utf-8", self.media_type),
            other => other.as_str().to_string(),
        }
    }
}

/// What the HTML page and the `alt` profile need to know about an entity.
pub trait Renderable {
    fn title(&self) -> String;
    fn links(&self) -> &[Link];

    /// Description as an HTML fragment safe to place in a page.
    fn description_html(&self) -> Option<String> {
        None
    }
}

type Serializer<R> =
    Box<dyn Fn(&R, &RenderContext<'_>) -> Result<Rendered, ApiError> + Send + Sync>;

/// Serializers for one resource type.
pub struct RenderTable<R> {
    name: &'static str,
    entries: HashMap<(&'static str, MediaType), Serializer<R>>,
}

impl<R: Renderable + 'static> RenderTable<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
        }
    }

    /// Register a serializer for one combination.
    pub fn with<F>(mut self, token: &'static str, media_type: MediaType, serializer: F) -> Self
    where
        F: Fn(&R, &RenderContext<'_>) -> Result<Rendered, ApiError> + Send + Sync + 'static,
    {
        self.entries.insert((token, media_type), Box::new(serializer));
        self
    }

    /// A JSON document for `media_type` (`application/json` or GeoJSON).
    pub fn with_json(
        self,
        token: &'static str,
        media_type: MediaType,
        to_json: fn(&R) -> Result<Value, ApiError>,
    ) -> Self {
        self.with(token, media_type, move |entity, _| {
            let value = to_json(entity)?;
            let body = serde_json::to_string_pretty(&value)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            Ok(Rendered::new(body, media_type))
        })
    }

    /// An HTML page through the HTML collaborator, with the entity's JSON
    /// form as context.
    pub fn with_html(
        self,
        token: &'static str,
        template: &'static str,
        to_json: fn(&R) -> Result<Value, ApiError>,
    ) -> Self {
        self.with(token, MediaType::Html, move |entity, ctx| {
            let context = page_context(entity, ctx, json!({ "entity": to_json(entity)? }));
            let body = ctx.html.render(template, &context)?;
            Ok(Rendered::new(body, MediaType::Html))
        })
    }

    /// Every RDF media type (and `application/json` as JSON-LD) from one
    /// graph, plus an HTML page showing the graph as Turtle.
    pub fn with_graph(self, token: &'static str, to_graph: fn(&R) -> Graph) -> Self {
        let mut table = self;
        for media_type in RDF_MEDIA_TYPES.iter().copied() {
            table = table.with(token, media_type, move |entity, _| {
                Ok(Rendered::new(to_graph(entity).serialize(media_type)?, media_type))
            });
        }
        table.with(token, MediaType::Html, move |entity, ctx| {
            let turtle = to_graph(entity).serialize(MediaType::Turtle)?;
            let context = page_context(entity, ctx, json!({ "rdf": turtle }));
            let body = ctx.html.render("graph", &context)?;
            Ok(Rendered::new(body, MediaType::Html))
        })
    }

    /// The `alt` profile in every media type it declares.
    pub fn with_alt(self) -> Self {
        let mut table = self.with(ALT, MediaType::Html, |entity, ctx| {
            let context = page_context(entity, ctx, json!({ "alternates": alt::to_json(ctx) }));
            let body = ctx.html.render("alt", &context)?;
            Ok(Rendered::new(body, MediaType::Html))
        });
        table = table.with(ALT, MediaType::Json, |_, ctx| {
            let body = serde_json::to_string_pretty(&alt::to_json(ctx))
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            Ok(Rendered::new(body, MediaType::Json))
        });
        for media_type in RDF_MEDIA_TYPES.iter().copied().filter(MediaType::is_rdf) {
            table = table.with(ALT, media_type, move |_, ctx| {
                Ok(Rendered::new(alt::to_graph(ctx).serialize(media_type)?, media_type))
            });
        }
        table
    }

    /// Serialize `entity` in the negotiated representation.
    pub fn render(&self, entity: &R, ctx: &RenderContext<'_>) -> Result<Rendered, ApiError> {
        match self.entries.get(&ctx.negotiated.key()) {
            Some(serializer) => serializer(entity, ctx),
            None => Err(ApiError::UnsupportedRepresentation(format!(
                "the {} resource has no {} representation in the '{}' profile",
                self.name,
                ctx.negotiated.media_type,
                ctx.negotiated.token()
            ))),
        }
    }

    pub fn supports(&self, token: &str, media_type: MediaType) -> bool {
        self.entries.keys().any(|(t, m)| *t == token && *m == media_type)
    }

    /// Combinations declared by `resource` that have no serializer.
    pub fn missing(&self, resource: &ResourceProfiles) -> Vec<String> {
        let mut missing = Vec::new();
        for profile in &resource.profiles {
            for media_type in &profile.media_types {
                if !self.supports(profile.token, *media_type) {
                    missing.push(format!("{} as {}", profile.token, media_type));
                }
            }
        }
        missing
    }
}

/// Context shared by every HTML page: title, links, paging and the
/// resource-specific `extra` members.
fn page_context<R: Renderable>(entity: &R, ctx: &RenderContext<'_>, extra: Value) -> Value {
    let mut context = json!({
        "api_title": ctx.api_title,
        "base_url": ctx.base_url,
        "title": entity.title(),
        "uri": ctx.resource_url(),
        "profile": ctx.negotiated.profile,
        "links": entity.links(),
        "description": entity.description_html(),
    });
    if let (Some(target), Value::Object(extra)) = (context.as_object_mut(), extra) {
        target.extend(extra);
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use features_protocol::profiles::OAI;
    use features_protocol::{Profile, RelType};

    struct Thing {
        links: Vec<Link>,
    }

    impl Renderable for Thing {
        fn title(&self) -> String {
            "Thing".to_string()
        }

        fn links(&self) -> &[Link] {
            &self.links
        }
    }

    fn thing() -> Thing {
        Thing {
            links: vec![Link::new("http://localhost:5000/thing", RelType::Self_)],
        }
    }

    fn resource() -> ResourceProfiles {
        ResourceProfiles::new("thing", vec![Profile::oai(&[MediaType::Html, MediaType::Json])], OAI, &[])
    }

    fn render_as(
        table: &RenderTable<Thing>,
        resource: &ResourceProfiles,
        token: &str,
        media_type: MediaType,
    ) -> Result<Rendered, ApiError> {
        let negotiated = Negotiated {
            profile: resource.get(token).cloned().unwrap(),
            media_type,
        };
        let html = BasicHtml;
        let ctx = RenderContext {
            resource,
            negotiated: &negotiated,
            self_url: "http://localhost:5000/thing?_profile=alt",
            params: &[],
            api_title: "Test",
            base_url: "http://localhost:5000",
            html: &html,
        };
        table.render(&thing(), &ctx)
    }

    #[test]
    fn test_missing_combinations_are_listed() {
        let table = RenderTable::<Thing>::new("thing")
            .with_json(OAI, MediaType::Json, |_| Ok(json!({})))
            .with_alt();
        assert_eq!(table.missing(&resource()), vec!["oai as text/html".to_string()]);
    }

    #[test]
    fn test_lookup_miss_is_unsupported_representation() {
        let table = RenderTable::<Thing>::new("thing").with_json(OAI, MediaType::Json, |_| Ok(json!({})));
        let err = render_as(&table, &resource(), OAI, MediaType::Html).unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedRepresentation(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_alt_json_lists_profiles() {
        let table = RenderTable::<Thing>::new("thing").with_alt();
        let rendered = render_as(&table, &resource(), ALT, MediaType::Json).unwrap();
        let value: Value = serde_json::from_str(&rendered.body).unwrap();
        let tokens: Vec<&str> = value["profiles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["token"].as_str().unwrap())
            .collect();
        assert_eq!(tokens, vec!["oai", "alt"]);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            Rendered::new("", MediaType::Html).content_type(),
            "text/html; charset=utf-8"
        );
        assert_eq!(Rendered::new("", MediaType::GeoJson).content_type(), "application/geo+json");
    }
}
