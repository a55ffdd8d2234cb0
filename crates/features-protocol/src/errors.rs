//! API error types.

use thiserror::Error;

use crate::responses::ExceptionResponse;

/// Errors that can occur while serving a request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// A query parameter outside the resource's allow-list.
    #[error(
        "The parameter '{param}' you supplied is not allowed. For this API endpoint, you may only use one of '{allowed}'"
    )]
    ParameterNotAllowed { param: String, allowed: String },

    /// A query parameter with an unusable value.
    #[error("The parameter '{param}' you supplied is invalid: {message}")]
    InvalidParameter { param: String, message: String },

    /// A `bbox` value matching none of the accepted shapes.
    #[error(
        "The parameter 'bbox' you supplied ('{0}') is invalid. It must be either four comma-separated \
         coordinates west,south,east,north (coords, e.g. 160.6,-55.95,-170,-25.89), a single DGGS \
         cell ID (cell_id, e.g. R1234) or a pair of DGGS cell IDs (cell_ids, e.g. R123,R456)"
    )]
    InvalidBbox(String),

    /// A profile token or URI not registered for the resource.
    #[error("The profile '{requested}' is not available for this resource. Available profiles: {available}")]
    UnknownProfile { requested: String, available: String },

    /// An explicitly requested media type the profile cannot produce.
    #[error("The media type '{requested}' is not available for the '{profile}' profile. Available media types: {available}")]
    UnsupportedMediaType {
        requested: String,
        profile: String,
        available: String,
    },

    /// A negotiation header that could not be parsed.
    #[error("The {header} header could not be parsed: {message}")]
    MalformedHeader { header: String, message: String },

    /// The negotiated representation cannot be produced for this entity.
    #[error("The requested representation is not available: {0}")]
    UnsupportedRepresentation(String),

    /// No collection with the given identifier.
    #[error("You have entered an unknown Collection ID: {0}")]
    CollectionNotFound(String),

    /// No feature with the given identifier in the given collection.
    #[error("The Feature '{item_id}' is not part of the Collection '{collection_id}'")]
    FeatureNotFound {
        collection_id: String,
        item_id: String,
    },

    /// The graph store failed. Carries the cause for logging only.
    #[error("Upstream query failed: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for [`ApiError::InvalidParameter`].
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ParameterNotAllowed { .. } => 400,
            ApiError::InvalidParameter { .. } => 400,
            ApiError::InvalidBbox(_) => 400,
            ApiError::UnknownProfile { .. } => 400,
            ApiError::UnsupportedMediaType { .. } => 400,
            ApiError::MalformedHeader { .. } => 400,
            ApiError::UnsupportedRepresentation(_) => 400,
            ApiError::CollectionNotFound(_) => 404,
            ApiError::FeatureNotFound { .. } => 404,
            ApiError::Upstream(_) => 500,
            ApiError::Internal(_) => 500,
        }
    }

    /// Whether this error is the caller's fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Convert to an ExceptionResponse.
    ///
    /// Server-side errors never expose their cause.
    pub fn to_exception(&self) -> ExceptionResponse {
        match self {
            ApiError::CollectionNotFound(_) | ApiError::FeatureNotFound { .. } => {
                ExceptionResponse::not_found(self.to_string())
            }
            ApiError::Upstream(_) => ExceptionResponse::internal_error(
                "The data store could not complete the request",
            ),
            ApiError::Internal(_) => {
                ExceptionResponse::internal_error("The server could not complete the request")
            }
            _ => ExceptionResponse::bad_request(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::ParameterNotAllowed {
                param: "foo".into(),
                allowed: "_profile".into()
            }
            .status_code(),
            400
        );
        assert_eq!(ApiError::InvalidBbox("x".into()).status_code(), 400);
        assert_eq!(ApiError::CollectionNotFound("x".into()).status_code(), 404);
        assert_eq!(ApiError::Upstream("timeout".into()).status_code(), 500);
    }

    #[test]
    fn test_parameter_not_allowed_names_parameter() {
        let err = ApiError::ParameterNotAllowed {
            param: "colour".into(),
            allowed: "_profile', '_mediatype".into(),
        };
        let exc = err.to_exception();
        assert_eq!(exc.status, Some(400));
        assert!(exc.detail.unwrap().contains("'colour'"));
    }

    #[test]
    fn test_bbox_error_lists_all_shapes() {
        let message = ApiError::InvalidBbox("not-a-bbox".into()).to_string();
        assert!(message.contains("not-a-bbox"));
        assert!(message.contains("coords"));
        assert!(message.contains("cell_id"));
        assert!(message.contains("cell_ids"));
    }

    #[test]
    fn test_upstream_detail_is_generic() {
        let err = ApiError::Upstream("SELECT ?f WHERE { ?f a geo:Feature } -- timeout".into());
        let exc = err.to_exception();
        assert_eq!(exc.status, Some(500));
        let detail = exc.detail.unwrap();
        assert!(!detail.contains("SELECT"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_not_found_exception() {
        let err = ApiError::FeatureNotFound {
            collection_id: "river".into(),
            item_id: "101".into(),
        };
        let exc = err.to_exception();
        assert_eq!(exc.status, Some(404));
        assert!(exc.type_.contains("not-found"));
    }
}
