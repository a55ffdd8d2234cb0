//! Collections endpoint handlers.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, Uri},
    response::Response,
};
use std::sync::Arc;

use crate::handlers::{finish, query_pairs, render_response, RequestParts};
use crate::metrics::Timer;
use crate::negotiation::negotiate;
use crate::query::window_from_params;
use crate::state::AppState;

/// GET /collections - List collections
pub async fn list_collections_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let timer = Timer::start();
    let params = query_pairs(&uri);
    let request = RequestParts {
        resource: &state.resources.collections,
        uri: &uri,
        params: &params,
    };

    let result = async {
        let negotiated = negotiate(request.resource, &params, &headers)?;
        let window = window_from_params(&params, state.engine.max_page_size())?;
        let list = state.engine.collections(window).await?;
        render_response(&state, &request, &state.renderers.collections, &negotiated, &list)
    }
    .await;

    finish(request.resource.name, timer, result)
}

/// GET /collections/:collection_id - One collection
pub async fn get_collection_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(collection_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let timer = Timer::start();
    let params = query_pairs(&uri);
    let request = RequestParts {
        resource: &state.resources.collection,
        uri: &uri,
        params: &params,
    };

    let result = async {
        let negotiated = negotiate(request.resource, &params, &headers)?;
        let collection = state.engine.collection(&collection_id).await?;
        render_response(
            &state,
            &request,
            &state.renderers.collection,
            &negotiated,
            &collection,
        )
    }
    .await;

    finish(request.resource.name, timer, result)
}
