//! Response representation and rendering.
//!
//! # Responsibilities
//! - Carry status, headers and a JSON payload back from handlers
//! - Render [`ApiError`] values as `{code, message, data}` payloads
//! - Convert into an axum response at the edge
//!
//! # Design Decisions
//! - Payloads are always JSON so they can be rewritten after dispatch
//! - Header insertion never fails the response; invalid values are logged and dropped

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// A handler response before it is written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Serialize any payload into a 200 response.
    pub fn json<T: Serialize>(payload: &T) -> Result<Self, ApiError> {
        serde_json::to_value(payload)
            .map(Self::ok)
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Dropping invalid response header"),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Mutable access to the payload when it is a JSON object.
    pub fn body_object_mut(&mut self) -> Option<&mut serde_json::Map<String, Value>> {
        self.body.as_object_mut()
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        let mut data = json!({ "status": status.as_u16() });
        if let ApiError::UnknownGroup { group, available } = &err {
            data["group"] = json!(group);
            data["available"] = json!(available);
        }

        let mut body = json!({
            "code": err.code(),
            "message": err.to_string(),
            "data": data,
        });
        if let ApiError::UnknownGroup { available, .. } = &err {
            body["error"] = json!(err.to_string());
            body["available"] = json!(available);
        }

        ApiResponse::new(status, body)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let bytes = match serde_json::to_vec(&self.body) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode response body");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
