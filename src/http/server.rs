//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: one catch-all handler over the route table
//! - Wire up middleware (timeout, request ID, tracing)
//! - Convert axum requests into `ApiRequest` and responses back
//! - Record request metrics
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::App;
use crate::error::ApiError;
use crate::http::request::{RequestUuid, X_REQUEST_ID};
use crate::http::ApiRequest;
use crate::lifecycle::wait_for;
use crate::observability::metrics;
use crate::routing::RouteTable;

/// State injected into the catch-all handler.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub max_body_bytes: usize,
}

/// HTTP front end for the route table.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(app: &App) -> Self {
        let config = app.config();
        let state = AppState {
            table: Arc::clone(app.table()),
            max_body_bytes: config.listener.max_body_bytes,
        };
        Self {
            router: Self::build_router(state, Duration::from_secs(config.timeouts.request_secs)),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/{*path}", any(api_handler))
            .route("/", any(api_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// The router, for serving elsewhere or driving with `oneshot` in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every path is resolved by the route table.
async fn api_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let (parts, body) = request.into_parts();

    let converted = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => ApiRequest::from_http(&parts, &bytes),
        Err(err) => Err(ApiError::BadRequest(format!(
            "request body could not be read: {}",
            err
        ))),
    };
    let response = match converted {
        Ok(api_request) => state.table.dispatch(api_request).await,
        Err(err) => state.table.reject(parts.uri.path(), err),
    };

    tracing::debug!(status = response.status.as_u16(), path = %parts.uri.path(), "Request dispatched");
    metrics::record_request(&method, response.status.as_u16(), start);
    response.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_id_and_json_errors() {
        let app = App::builder(RegistryConfig::default()).build();
        let router = HttpServer::new(&app).router();

        let response = router
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(response.headers()["content-type"], "application/json");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "rest_no_route");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = RegistryConfig::default();
        config.listener.max_body_bytes = 8;
        let app = App::builder(config).build();
        let router = HttpServer::new(&app).router();

        let response = router
            .oneshot(
                Request::post("/app/v1/discover")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"far":"too long for the limit"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
