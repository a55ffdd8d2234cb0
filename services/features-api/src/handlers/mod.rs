//! HTTP request handlers for the features API.
//!
//! Every negotiated handler follows the same steps: negotiate (which checks
//! the allowed parameters first), validate content parameters, fetch through
//! the query engine, then render through the resource's table.

pub mod api;
pub mod collections;
pub mod conformance;
pub mod health;
pub mod items;
pub mod landing;

use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;

use features_protocol::ApiError;

use crate::error::AppError;
use crate::metrics::{self, Timer};
use crate::negotiation::{link_header, Negotiated, ResourceProfiles, CONTENT_PROFILE};
use crate::render::{RenderContext, RenderTable, Renderable};
use crate::state::AppState;

/// Decoded query parameters in request order.
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// The public URL of the current request.
pub fn request_url(base_url: &str, uri: &Uri) -> String {
    let path = match uri.path() {
        "/" => "",
        path => path,
    };
    match uri.query() {
        Some(query) => format!("{}{}?{}", base_url, path, query),
        None => format!("{}{}", base_url, path),
    }
}

/// Everything about the current request a renderer needs.
pub struct RequestParts<'a> {
    pub resource: &'a ResourceProfiles,
    pub uri: &'a Uri,
    pub params: &'a [(String, String)],
}

/// Render `entity` with the negotiated representation and attach the
/// negotiation headers.
pub fn render_response<R: Renderable + 'static>(
    state: &AppState,
    request: &RequestParts<'_>,
    table: &RenderTable<R>,
    negotiated: &Negotiated,
    entity: &R,
) -> Result<Response, ApiError> {
    let self_url = request_url(&state.config.base_url, request.uri);
    let ctx = RenderContext {
        resource: request.resource,
        negotiated,
        self_url: &self_url,
        params: request.params,
        api_title: &state.config.api_title,
        base_url: &state.config.base_url,
        html: state.html.as_ref(),
    };
    let rendered = table.render(entity, &ctx)?;

    let header_value = |value: String| {
        HeaderValue::from_str(&value).map_err(|e| ApiError::Internal(e.to_string()))
    };
    let headers = [
        (header::CONTENT_TYPE, header_value(rendered.content_type())?),
        (CONTENT_PROFILE, header_value(format!("<{}>", negotiated.profile.uri))?),
        (
            header::LINK,
            header_value(link_header(request.resource, negotiated, &self_url, request.params))?,
        ),
    ];

    metrics::record_request(request.resource.name, negotiated.token(), negotiated.media_type);
    Ok((StatusCode::OK, headers, rendered.body).into_response())
}

/// Turn a handler result into a response, recording metrics.
pub fn finish(resource: &'static str, timer: Timer, result: Result<Response, ApiError>) -> Response {
    metrics::record_duration(resource, &timer);
    match result {
        Ok(response) => response,
        Err(e) => {
            metrics::record_error(resource, e.status_code());
            AppError(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_decodes_in_order() {
        let uri: Uri = "/collections/catch/items?bbox=R123%2CR456&_mediatype=text%2Fturtle&page=2"
            .parse()
            .unwrap();
        assert_eq!(
            query_pairs(&uri),
            vec![
                ("bbox".to_string(), "R123,R456".to_string()),
                ("_mediatype".to_string(), "text/turtle".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url() {
        let base = "http://localhost:5000";
        assert_eq!(request_url(base, &"/".parse().unwrap()), "http://localhost:5000");
        assert_eq!(
            request_url(base, &"/collections?page=2".parse().unwrap()),
            "http://localhost:5000/collections?page=2"
        );
    }
}
