//! Deprecation reporting for privileged callers.

use std::sync::Arc;

use serde_json::json;

use crate::compat::LegacyDispatcher;
use crate::error::{ApiError, RegistryError};
use crate::http::{ApiRequest, ApiResponse, HttpMethod};
use crate::registry::{Controller, RouteKey, RouteRegistration, RouteRegistry};
use crate::routing::{handler, Handler, PermissionCheck};
use crate::telemetry::DeprecationTelemetry;

/// Owning module and group recorded for admin routes.
pub const ADMIN_MODULE: &str = "admin";

/// Serves `admin/deprecations`: GET reports, DELETE resets.
pub struct AdminController {
    namespace: String,
    telemetry: Arc<DeprecationTelemetry>,
    dispatcher: Option<Arc<LegacyDispatcher>>,
    permission: PermissionCheck,
}

impl AdminController {
    pub fn new(
        namespace: &str,
        telemetry: Arc<DeprecationTelemetry>,
        dispatcher: Option<Arc<LegacyDispatcher>>,
        permission: PermissionCheck,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            telemetry,
            dispatcher,
            permission,
        }
    }

    fn deprecations(&self) -> Handler {
        let telemetry = Arc::clone(&self.telemetry);
        let dispatcher = self.dispatcher.clone();
        handler(move |request: ApiRequest| {
            let telemetry = Arc::clone(&telemetry);
            let redirect_count = dispatcher.as_ref().map_or(0, |d| d.redirect_count());
            async move {
                match request.method {
                    HttpMethod::Delete => clear(telemetry, &request).await,
                    _ => report(telemetry, redirect_count).await,
                }
            }
        })
    }
}

impl Controller for AdminController {
    fn register_routes(&self, registry: &RouteRegistry) -> Result<(), RegistryError> {
        registry.register(
            RouteRegistration::new(
                RouteKey::new(&self.namespace, "admin/deprecations"),
                self.deprecations(),
            )
            .methods([HttpMethod::Get, HttpMethod::Delete])
            .permission(Arc::clone(&self.permission))
            .module(ADMIN_MODULE)
            .group(ADMIN_MODULE),
        )
    }
}

async fn report(
    telemetry: Arc<DeprecationTelemetry>,
    redirect_count: u64,
) -> Result<ApiResponse, ApiError> {
    let pending = telemetry.pending();
    let persisted = tokio::task::spawn_blocking(move || telemetry.get_stats())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(ApiResponse::ok(json!({
        "redirect_count": redirect_count,
        "pending": pending,
        "persisted": persisted,
    })))
}

async fn clear(
    telemetry: Arc<DeprecationTelemetry>,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    tokio::task::spawn_blocking(move || telemetry.clear_stats())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::warn!(
        request_id = request.request_id().unwrap_or("-"),
        "Deprecation statistics cleared"
    );
    Ok(ApiResponse::ok(json!({ "cleared": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::BearerAuthorizer;
    use crate::routing::RouteTable;
    use crate::telemetry::{MemoryStore, TelemetryOptions};
    use axum::http::StatusCode;

    fn setup() -> (RouteRegistry, Arc<DeprecationTelemetry>) {
        let registry = RouteRegistry::new(Arc::new(RouteTable::new()));
        let telemetry = Arc::new(DeprecationTelemetry::new(
            Arc::new(MemoryStore::new()),
            TelemetryOptions::default(),
        ));
        let controller = AdminController::new(
            "app/v1",
            Arc::clone(&telemetry),
            None,
            BearerAuthorizer::new("secret").into_permission(),
        );
        registry
            .register_controller("admin", Arc::new(controller))
            .unwrap();
        (registry, telemetry)
    }

    fn request(method: HttpMethod) -> ApiRequest {
        ApiRequest::new(method, "app/v1/admin/deprecations").with_header("authorization", "Bearer secret")
    }

    #[tokio::test]
    async fn test_report_and_clear() {
        let (registry, telemetry) = setup();
        let legacy = ApiRequest::new(HttpMethod::Get, "old/v1/events");
        telemetry.record_deprecation("old/v1/events", "app/v1/events", &legacy);
        telemetry.record_deprecation("old/v1/feed", "app/v1/social/feed", &legacy);
        telemetry.flush().unwrap();
        telemetry.record_deprecation("old/v1/events", "app/v1/events", &legacy);

        let resp = registry.table().dispatch(request(HttpMethod::Get)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body["redirect_count"], 0);
        assert_eq!(resp.body["persisted"]["old/v1/events"]["total_count"], 1);
        assert_eq!(resp.body["pending"]["old/v1/events"]["call_count"], 1);

        let resp = registry.table().dispatch(request(HttpMethod::Delete)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(telemetry.get_stats().unwrap().is_empty());
        assert!(telemetry.pending().is_empty());
    }

    #[tokio::test]
    async fn test_requires_key() {
        let (registry, _) = setup();

        let anonymous = ApiRequest::new(HttpMethod::Delete, "app/v1/admin/deprecations");
        let resp = registry.table().dispatch(anonymous).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

        let wrong = ApiRequest::new(HttpMethod::Delete, "app/v1/admin/deprecations")
            .with_header("authorization", "Bearer nope");
        let resp = registry.table().dispatch(wrong).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN);
    }
}
