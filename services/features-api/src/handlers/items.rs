//! Feature handlers.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, Uri},
    response::Response,
};
use std::sync::Arc;

use crate::handlers::{finish, query_pairs, render_response, RequestParts};
use crate::metrics::Timer;
use crate::negotiation::negotiate;
use crate::query::FeatureQuery;
use crate::state::AppState;

/// GET /collections/:collection_id/items - One page of features
pub async fn list_items_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(collection_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let timer = Timer::start();
    let params = query_pairs(&uri);
    let request = RequestParts {
        resource: &state.resources.items,
        uri: &uri,
        params: &params,
    };

    let result = async {
        let negotiated = negotiate(request.resource, &params, &headers)?;
        let query = FeatureQuery::from_params(&params, state.engine.max_page_size())?;
        let page = state.engine.features(&collection_id, &query).await?;
        render_response(&state, &request, &state.renderers.items, &negotiated, &page)
    }
    .await;

    finish(request.resource.name, timer, result)
}

/// GET /collections/:collection_id/items/:item_id - One feature
pub async fn get_item_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((collection_id, item_id)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let timer = Timer::start();
    let params = query_pairs(&uri);
    let request = RequestParts {
        resource: &state.resources.item,
        uri: &uri,
        params: &params,
    };

    let result = async {
        let negotiated = negotiate(request.resource, &params, &headers)?;
        let feature = state.engine.feature(&collection_id, &item_id).await?;
        render_response(&state, &request, &state.renderers.item, &negotiated, &feature)
    }
    .await;

    finish(request.resource.name, timer, result)
}
