//! Request representation used by the route table and every handler.
//!
//! # Responsibilities
//! - Convert an incoming axum request into an [`ApiRequest`]
//! - Carry query, body and resolved path parameters through dispatch
//! - Allow internal requests to be built programmatically (legacy forwarding)
//!
//! # Design Decisions
//! - Parameters are kept in ordered maps so rewritten URLs are deterministic
//! - Body parameters are JSON; form bodies are folded into a JSON object
//! - Headers are kept verbatim so internal requests can copy them

use std::collections::BTreeMap;
use std::fmt;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Assigns a UUID v4 to requests that arrive without an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// HTTP methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Map an `http::Method`; extension methods are not routable.
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(HttpMethod::Get),
            Method::POST => Some(HttpMethod::Post),
            Method::PUT => Some(HttpMethod::Put),
            Method::PATCH => Some(HttpMethod::Patch),
            Method::DELETE => Some(HttpMethod::Delete),
            Method::HEAD => Some(HttpMethod::Head),
            Method::OPTIONS => Some(HttpMethod::Options),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as seen by route handlers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Full route path without leading or trailing slashes, e.g. `app/v1/events/7`.
    pub route: String,
    /// Namespace of the route that matched; set by the route table.
    pub namespace: Option<String>,
    /// Query pairs in received order; a key may repeat.
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    pub path_params: BTreeMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, route: impl AsRef<str>) -> Self {
        Self {
            method,
            route: normalize_path(route.as_ref()),
            namespace: None,
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            path_params: BTreeMap::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Build from axum request parts and a buffered body.
    pub fn from_http(parts: &Parts, body: &Bytes) -> Result<Self, ApiError> {
        let method = HttpMethod::from_http(&parts.method).ok_or(ApiError::MethodNotAllowed)?;

        let query = parts
            .uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let mut request = Self::new(method, parts.uri.path());
        request.query = query;
        request.headers = parts.headers.clone();
        request.body = parse_body(&parts.headers, body)?;
        Ok(request)
    }

    /// Look up a parameter: path first, then query, then body.
    pub fn param(&self, name: &str) -> Option<String> {
        if let Some(v) = self.path_params.get(name) {
            return Some(v.clone());
        }
        if let Some(v) = self.query_values(name).next() {
            return Some(v.to_string());
        }
        match self.body.as_ref().and_then(|b| b.get(name)) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    /// Every query value given for `name`, in received order.
    pub fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// Query parameters encoded as `a=1&b=2`, empty when there are none.
    pub fn query_string(&self) -> String {
        encode_query(&self.query)
    }
}

/// Strip leading/trailing slashes and collapse empty segments.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn encode_query(query: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in query {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<Option<Value>, ApiError> {
    if body.is_empty() {
        return Ok(None);
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields = url::form_urlencoded::parse(body)
            .into_owned()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<serde_json::Map<String, Value>>();
        return Ok(Some(Value::Object(fields)));
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("body is not valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/app/v1/events/"), "app/v1/events");
        assert_eq!(normalize_path("app//v1"), "app/v1");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn test_from_http_parses_query_and_json_body() {
        let (parts, _) = Request::builder()
            .method("POST")
            .uri("http://example.com/app/v1/events?page=2&per_page=10")
            .header("content-type", "application/json")
            .body(())
            .unwrap()
            .into_parts();
        let body = Bytes::from_static(br#"{"title":"Picnic"}"#);

        let req = ApiRequest::from_http(&parts, &body).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.route, "app/v1/events");
        assert_eq!(req.param("page").as_deref(), Some("2"));
        assert_eq!(req.param("title").as_deref(), Some("Picnic"));
        assert_eq!(req.query_string(), "page=2&per_page=10");
    }

    #[test]
    fn test_repeated_query_keys_survive() {
        let (parts, _) = Request::builder()
            .uri("/old/v1/events?tag=a&page=2&tag=b")
            .body(())
            .unwrap()
            .into_parts();

        let req = ApiRequest::from_http(&parts, &Bytes::new()).unwrap();
        assert_eq!(req.query_values("tag").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(req.param("tag").as_deref(), Some("a"));
        assert_eq!(req.query_string(), "tag=a&page=2&tag=b");
    }

    #[test]
    fn test_from_http_folds_form_body() {
        let (parts, _) = Request::builder()
            .method("POST")
            .uri("/app/v1/events")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap()
            .into_parts();
        let body = Bytes::from_static(b"title=Picnic+Day&capacity=20");

        let req = ApiRequest::from_http(&parts, &body).unwrap();
        assert_eq!(req.param("title").as_deref(), Some("Picnic Day"));
        assert_eq!(req.param("capacity").as_deref(), Some("20"));
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let (parts, _) = Request::builder()
            .method("POST")
            .uri("/app/v1/events")
            .body(())
            .unwrap()
            .into_parts();
        let err = ApiRequest::from_http(&parts, &Bytes::from_static(b"{nope")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_param_precedence() {
        let mut req = ApiRequest::new(HttpMethod::Get, "app/v1/events/3")
            .with_query("id", "from-query")
            .with_body(serde_json::json!({"id": 9, "draft": true}));
        assert_eq!(req.param("id").as_deref(), Some("from-query"));
        req.path_params.insert("id".into(), "3".into());
        assert_eq!(req.param("id").as_deref(), Some("3"));
        assert_eq!(req.param("draft").as_deref(), Some("true"));
    }
}
