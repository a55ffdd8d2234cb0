//! OpenAPI definition handlers.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use features_protocol::{ApiError, MediaType};

use crate::error::AppError;
use crate::state::AppState;

/// OpenAPI 3.0 definition of the features API
const OPENAPI_SPEC: &str = include_str!("../openapi.yaml");

/// The OpenAPI definition as JSON.
pub fn openapi_json() -> Result<serde_json::Value, ApiError> {
    serde_yaml::from_str(OPENAPI_SPEC).map_err(|e| ApiError::Internal(e.to_string()))
}

/// GET /spec - OpenAPI definition
pub async fn api_handler() -> Response {
    match openapi_json() {
        Ok(spec) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, MediaType::OpenApi.as_str()),
                (header::CACHE_CONTROL, "max-age=3600"),
            ],
            spec.to_string(),
        )
            .into_response(),
        Err(e) => AppError(e).into_response(),
    }
}

/// GET /doc - API documentation page
pub async fn api_html_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{} API Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {{ margin: 0; padding: 0; }}
    </style>
</head>
<body>
    <redoc spec-url='{}/spec'></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
</body>
</html>"#,
        crate::render::html::escape(&state.config.api_title),
        state.config.base_url
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "max-age=3600"),
        ],
        html,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let spec = openapi_json().unwrap();
        let paths = spec["paths"].as_object().unwrap();
        for path in [
            "/",
            "/conformance",
            "/collections",
            "/collections/{collectionId}",
            "/collections/{collectionId}/items",
            "/collections/{collectionId}/items/{featureId}",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }

    #[tokio::test]
    async fn test_api_handler_serves_json() {
        let response = api_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/vnd.oai.openapi+json;version=3.0"
        );
    }
}
