//! HTML pages.
//!
//! Page layout is delegated to an [`HtmlTemplates`] implementation that
//! receives a JSON context. [`BasicHtml`] is the built-in one: a single
//! self-contained page with no assets.

use serde_json::Value;

use features_protocol::ApiError;

/// Renders a named page from a JSON context.
///
/// Context members: `api_title`, `base_url`, `title`, `uri`, `profile`,
/// `links`, `description` (sanitized HTML or null), and one of `entity` (structured JSON), `rdf` (Turtle text) or
/// `alternates`.
pub trait HtmlTemplates: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, ApiError>;
}

/// Minimal built-in page renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicHtml;

impl HtmlTemplates for BasicHtml {
    fn render(&self, template: &str, context: &Value) -> Result<String, ApiError> {
        let text = |key: &str| context.get(key).and_then(Value::as_str).unwrap_or("");
        let title = escape(text("title"));
        let api_title = escape(text("api_title"));

        let mut body = String::new();
        body.push_str(&format!(
            "<header><a href=\"{}\">{}</a></header>\n<h1>{}</h1>\n",
            escape(text("base_url")),
            api_title,
            title
        ));

        if let Some(description) = context.get("description").and_then(Value::as_str) {
            body.push_str(&format!("<div class=\"description\">{}</div>\n", description));
        }

        if let Some(entity) = context.get("entity") {
            let pretty = serde_json::to_string_pretty(entity)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            body.push_str(&format!("<pre class=\"entity\">{}</pre>\n", escape(&pretty)));
        }

        if let Some(rdf) = context.get("rdf").and_then(Value::as_str) {
            body.push_str(&format!("<pre class=\"rdf\">{}</pre>\n", escape(rdf)));
        }

        if let Some(profiles) = context
            .get("alternates")
            .and_then(|a| a.get("profiles"))
            .and_then(Value::as_array)
        {
            body.push_str("<table class=\"alternates\">\n<tr><th>Profile</th><th>Token</th><th>Media types</th></tr>\n");
            for profile in profiles {
                let field = |key: &str| escape(profile.get(key).and_then(Value::as_str).unwrap_or(""));
                let representations = profile
                    .get("representations")
                    .and_then(Value::as_array)
                    .map(|reps| {
                        reps.iter()
                            .map(|r| {
                                let s = |key: &str| escape(r.get(key).and_then(Value::as_str).unwrap_or(""));
                                format!("<a href=\"{}\">{}</a>", s("href"), s("mediaType"))
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                body.push_str(&format!(
                    "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>\n",
                    field("uri"),
                    field("label"),
                    field("token"),
                    representations
                ));
            }
            body.push_str("</table>\n");
        }

        if let Some(links) = context.get("links").and_then(Value::as_array) {
            body.push_str("<h2>Links</h2>\n<ul class=\"links\">\n");
            for link in links {
                let field = |key: &str| escape(link.get(key).and_then(Value::as_str).unwrap_or(""));
                let label = match link.get("title").and_then(Value::as_str) {
                    Some(t) => escape(t),
                    None => field("href"),
                };
                body.push_str(&format!(
                    "<li><a href=\"{}\" rel=\"{}\">{}</a></li>\n",
                    field("href"),
                    field("rel"),
                    label
                ));
            }
            body.push_str("</ul>\n");
        }

        Ok(format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\"/>\n<title>{} | {}</title>\n</head>\n<body class=\"{}\">\n{}</body>\n</html>\n",
            title,
            api_title,
            escape(template),
            body
        ))
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
