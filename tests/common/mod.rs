//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use route_registry::config::RegistryConfig;
use route_registry::lifecycle::Shutdown;
use route_registry::registry::{RouteKey, RouteRegistration, RouteRegistry};
use route_registry::{handler, ApiError, ApiRequest, ApiResponse, App, HttpMethod, HttpServer, RegistryError};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Default configuration with a known admin key and base URL.
pub fn config() -> RegistryConfig {
    let mut config = RegistryConfig::default();
    config.admin.api_key = ADMIN_KEY.to_string();
    config.compat.public_base_url = "https://api.example.test".to_string();
    config
}

/// Canonical event routes, echoing what they received.
pub fn events_module(registry: &RouteRegistry) -> Result<(), RegistryError> {
    registry.register(
        RouteRegistration::new(
            RouteKey::new("app/v1", "events"),
            handler(|req: ApiRequest| async move {
                let page: u64 = req
                    .param("page")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(1)
                    .max(1);
                let items: Vec<Value> = (0..3)
                    .map(|i| json!({ "id": (page - 1) * 3 + i + 1 }))
                    .collect();
                Ok(ApiResponse::ok(json!({ "page": page, "items": items })))
            }),
        )
        .methods([HttpMethod::Get])
        .module("events")
        .group("events"),
    )?;

    registry.register(
        RouteRegistration::new(
            RouteKey::new("app/v1", "events/{id}"),
            handler(|req: ApiRequest| async move {
                let id = req.param("id").unwrap_or_default();
                if id == "404" {
                    return Err(ApiError::BadRequest(format!("no event {}", id)));
                }
                Ok(ApiResponse::ok(json!({ "id": id, "title": format!("Event {}", id) })))
            }),
        )
        .methods([HttpMethod::Get])
        .module("events")
        .group("events"),
    )?;

    registry.register(
        RouteRegistration::new(
            RouteKey::new("app/v1", "events/{id}/rsvps"),
            handler(|req: ApiRequest| async move {
                Ok(ApiResponse::ok(json!({
                    "event": req.param("id"),
                    "status": req.param("status"),
                }))
                .with_status(StatusCode::CREATED))
            }),
        )
        .methods([HttpMethod::Post])
        .module("events")
        .group("events"),
    )
}

/// A feed route that returns a bare JSON array.
pub fn social_module(registry: &RouteRegistry) -> Result<(), RegistryError> {
    registry.register(
        RouteRegistration::new(
            RouteKey::new("app/v1", "social/feed"),
            handler(|_| async { Ok(ApiResponse::ok(json!(["post-1", "post-2"]))) }),
        )
        .module("social")
        .group("social"),
    )
}

pub fn build_app(config: RegistryConfig) -> App {
    App::builder(config)
        .module("events", events_module)
        .module("social", social_module)
        .build()
}

pub fn router(app: &App) -> Router {
    HttpServer::new(app).router()
}

/// A response read fully into memory.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse { status, headers, body }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

/// Body with the injected deprecation block removed.
pub fn without_deprecation(mut body: Value) -> Value {
    if let Some(object) = body.as_object_mut() {
        object.remove("_deprecated");
    }
    body
}

/// Serve `app` on an ephemeral port until `shutdown` fires.
pub async fn start_server(app: &App, shutdown: &Shutdown) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(app);
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, handle)
}
