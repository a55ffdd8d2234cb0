//! Conformance handler.

use axum::{
    extract::Extension,
    http::{HeaderMap, Uri},
    response::Response,
};
use std::sync::Arc;

use crate::handlers::{finish, query_pairs, render_response, RequestParts};
use crate::metrics::Timer;
use crate::negotiation::negotiate;
use crate::state::AppState;

/// GET /conformance - Conformance declaration
pub async fn conformance_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let timer = Timer::start();
    let params = query_pairs(&uri);
    let request = RequestParts {
        resource: &state.resources.conformance,
        uri: &uri,
        params: &params,
    };

    let result = async {
        let negotiated = negotiate(request.resource, &params, &headers)?;
        let conformance = state.engine.conformance().await?;
        render_response(
            &state,
            &request,
            &state.renderers.conformance,
            &negotiated,
            &conformance,
        )
    }
    .await;

    finish(request.resource.name, timer, result)
}
