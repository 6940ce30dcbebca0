//! Discovery routes, registered through the registry they describe.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use serde_json::json;

use crate::error::{ApiError, RegistryError};
use crate::http::{ApiRequest, ApiResponse, HttpMethod};
use crate::registry::{Controller, RouteInfo, RouteKey, RouteRegistration, RouteRegistry};
use crate::routing::{allow_all, handler, Handler};

/// Owning module and group recorded for discovery routes.
pub const DISCOVERY_MODULE: &str = "discovery";

/// Serves `discover`, `discover/{group}` and `openapi` under one namespace.
pub struct DiscoveryController {
    registry: Weak<RouteRegistry>,
    namespace: String,
    legacy_namespaces: Vec<String>,
}

impl DiscoveryController {
    pub fn new(registry: &Arc<RouteRegistry>, namespace: &str) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            namespace: namespace.to_string(),
            legacy_namespaces: Vec::new(),
        }
    }

    /// Legacy namespaces listed in the `api` metadata block.
    pub fn with_legacy_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.legacy_namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    fn route(&self, path: &str, handler: Handler) -> RouteRegistration {
        RouteRegistration::new(RouteKey::new(&self.namespace, path), handler)
            .methods([HttpMethod::Get])
            .permission(allow_all())
            .module(DISCOVERY_MODULE)
            .group(DISCOVERY_MODULE)
    }

    fn discover_all(&self) -> Handler {
        let registry = self.registry.clone();
        let api = json!({
            "namespace": self.namespace,
            "legacy_namespaces": self.legacy_namespaces,
        });
        handler(move |_request: ApiRequest| {
            let registry = registry.clone();
            let mut api = api.clone();
            async move {
                let registry = upgrade(&registry)?;
                let info = registry.info();
                api["title"] = json!(info.title);
                api["version"] = json!(info.version);
                api["description"] = json!(info.description);

                Ok(ApiResponse::ok(json!({
                    "api": api,
                    "groups": registry.groups(),
                    "routes": route_infos(&registry, None),
                    "conflicts": registry.get_conflicts(),
                    "statistics": registry.get_statistics(),
                })))
            }
        })
    }

    fn discover_group(&self) -> Handler {
        let registry = self.registry.clone();
        handler(move |request: ApiRequest| {
            let registry = registry.clone();
            async move {
                let registry = upgrade(&registry)?;
                let group = request
                    .param("group")
                    .ok_or_else(|| ApiError::BadRequest("missing group".to_string()))?;

                if !registry.has_group(&group) {
                    return Err(ApiError::UnknownGroup {
                        group,
                        available: registry.groups(),
                    });
                }

                Ok(ApiResponse::ok(json!({
                    "group": group,
                    "routes": route_infos(&registry, Some(&group)),
                })))
            }
        })
    }

    fn openapi(&self) -> Handler {
        let registry = self.registry.clone();
        handler(move |_request: ApiRequest| {
            let registry = registry.clone();
            async move { Ok(ApiResponse::ok(upgrade(&registry)?.generate_api_spec())) }
        })
    }
}

impl Controller for DiscoveryController {
    fn register_routes(&self, registry: &RouteRegistry) -> Result<(), RegistryError> {
        registry.register(self.route("discover", self.discover_all()))?;
        registry.register(self.route("discover/{group}", self.discover_group()))?;
        registry.register(self.route("openapi", self.openapi()))?;
        Ok(())
    }
}

fn upgrade(registry: &Weak<RouteRegistry>) -> Result<Arc<RouteRegistry>, ApiError> {
    registry
        .upgrade()
        .ok_or_else(|| ApiError::Internal("route registry is gone".to_string()))
}

fn route_infos(registry: &RouteRegistry, group: Option<&str>) -> BTreeMap<String, RouteInfo> {
    let routes = match group {
        Some(group) => registry.get_routes_by_group(group),
        None => registry.get_routes(),
    };
    routes
        .into_iter()
        .map(|(key, registration)| (key.full(), registration.info()))
        .collect()
}
