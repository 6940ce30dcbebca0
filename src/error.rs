//! Error types shared across the registry, dispatch and telemetry layers.

use axum::http::StatusCode;
use thiserror::Error;

use crate::registry::RouteKey;

/// Errors raised while registering routes at bootstrap.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The route key is already owned by another registration.
    #[error("route {route_key} is already registered by {held_by} (attempted by {attempted_by})")]
    Conflict {
        route_key: RouteKey,
        attempted_by: String,
        held_by: String,
    },

    /// The route key cannot be bound.
    #[error("invalid route key {route}: {reason}")]
    InvalidRouteKey { route: String, reason: String },

    /// A registration was attempted without any HTTP method.
    #[error("route {0} registered without methods")]
    NoMethods(RouteKey),
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("No route was found matching the URL and request method.")]
    NoRoute,

    #[error("Method not allowed for this route.")]
    MethodNotAllowed,

    #[error("Sorry, you are not allowed to do that.")]
    Forbidden,

    #[error("Authentication required.")]
    Unauthorized,

    /// Discovery was asked for a group nothing registered into.
    #[error("Unknown route group: {group}")]
    UnknownGroup { group: String, available: Vec<String> },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The rewritten request for a legacy route could not be dispatched.
    #[error("Failed to forward {legacy_route} to {replacement}: {reason}")]
    Forwarding {
        legacy_route: String,
        replacement: String,
        reason: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable error code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NoRoute => "rest_no_route",
            ApiError::MethodNotAllowed => "rest_method_not_allowed",
            ApiError::Forbidden => "rest_forbidden",
            ApiError::Unauthorized => "rest_unauthorized",
            ApiError::UnknownGroup { .. } => "rest_unknown_group",
            ApiError::BadRequest(_) => "rest_invalid_request",
            ApiError::Forwarding { .. } => "rest_forwarding_failed",
            ApiError::Internal(_) => "rest_internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoRoute | ApiError::UnknownGroup { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forwarding { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure to persist or read aggregated deprecation telemetry.
///
/// Never propagated onto the request path; callers log and move on.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("telemetry store encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("telemetry store rejected write for {key}: {reason}")]
    Rejected { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_mapping() {
        assert_eq!(ApiError::NoRoute.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        let unknown = ApiError::UnknownGroup {
            group: "nope".into(),
            available: vec!["events".into()],
        };
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(unknown.code(), "rest_unknown_group");
    }

    #[test]
    fn test_conflict_display_names_both_modules() {
        let err = RegistryError::Conflict {
            route_key: RouteKey::new("app/v1", "events"),
            attempted_by: "b".into(),
            held_by: "a".into(),
        };
        let text = err.to_string();
        assert!(text.contains("app/v1/events"));
        assert!(text.contains("registered by a"));
        assert!(text.contains("attempted by b"));
    }
}
