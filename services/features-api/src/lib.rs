//! Features API Service Library
//!
//! HTTP server for an OGC API - Features service whose resources are
//! available in several profiles and media types, backed by a graph store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod negotiation;
pub mod query;
pub mod render;
pub mod resources;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the router with every route and the standard layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Landing page
        .route("/", get(handlers::landing::landing_handler))
        // API definition
        .route("/spec", get(handlers::api::api_handler))
        .route("/doc", get(handlers::api::api_html_handler))
        // Conformance
        .route(
            "/conformance",
            get(handlers::conformance::conformance_handler),
        )
        // Collections
        .route(
            "/collections",
            get(handlers::collections::list_collections_handler),
        )
        .route(
            "/collections/:collection_id",
            get(handlers::collections::get_collection_handler),
        )
        // Features
        .route(
            "/collections/:collection_id/items",
            get(handlers::items::list_items_handler),
        )
        .route(
            "/collections/:collection_id/items/:item_id",
            get(handlers::items::get_item_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
