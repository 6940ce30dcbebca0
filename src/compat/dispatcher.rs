//! Shadow routes for legacy paths.
//!
//! # Responsibilities
//! - Assemble the final legacy -> canonical mapping table
//! - Register one shadow route per mapping through the registry
//! - Rewrite, forward, and decorate legacy calls
//!
//! # Design Decisions
//! - Shadows reach the table through a `Weak` handle; the table owns the shadows
//! - Forwarding copies parameters verbatim and never re-validates them
//! - Every outcome is decorated, errors from the canonical handler included

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};

use crate::compat::headers::DeprecationNotice;
use crate::config::CompatConfig;
use crate::error::{ApiError, RegistryError};
use crate::http::{ApiRequest, ApiResponse, HttpMethod};
use crate::namespace::NamespaceResolver;
use crate::observability::metrics;
use crate::registry::{RouteKey, RouteRegistration, RouteRegistry};
use crate::routing::{allow_all, handler, substitute_placeholders, Handler, RouteTable};
use crate::telemetry::DeprecationTelemetry;

/// Owning module recorded for shadow routes.
pub const COMPAT_MODULE: &str = "legacy-compat";

/// Group shadow routes are listed under.
pub const LEGACY_GROUP: &str = "legacy";

/// Adjusts the mapping table before shadow routes are bound.
pub trait MappingExtension: Send + Sync {
    fn extend(&self, mappings: &mut BTreeMap<String, String>);
}

impl<F> MappingExtension for F
where
    F: Fn(&mut BTreeMap<String, String>) + Send + Sync,
{
    fn extend(&self, mappings: &mut BTreeMap<String, String>) {
        self(mappings)
    }
}

/// Settings for decorating forwarded responses.
#[derive(Debug, Clone)]
pub struct CompatOptions {
    pub sunset: DateTime<Utc>,
    pub public_base_url: String,
}

impl From<&CompatConfig> for CompatOptions {
    fn from(config: &CompatConfig) -> Self {
        Self {
            sunset: config.sunset,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for CompatOptions {
    fn default() -> Self {
        Self::from(&CompatConfig::default())
    }
}

/// The legacy compatibility dispatcher.
pub struct LegacyDispatcher {
    resolver: Arc<NamespaceResolver>,
    telemetry: Arc<DeprecationTelemetry>,
    options: CompatOptions,
    extensions: Vec<Arc<dyn MappingExtension>>,
    redirect_count: AtomicU64,
}

impl LegacyDispatcher {
    pub fn new(
        resolver: Arc<NamespaceResolver>,
        telemetry: Arc<DeprecationTelemetry>,
        options: CompatOptions,
    ) -> Self {
        Self {
            resolver,
            telemetry,
            options,
            extensions: Vec::new(),
            redirect_count: AtomicU64::new(0),
        }
    }

    /// Add a hook that may add, replace, or remove mappings.
    pub fn with_extension(mut self, extension: Arc<dyn MappingExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// The mapping table after every extension has run.
    pub fn legacy_mappings(&self) -> BTreeMap<String, String> {
        let mut mappings = self.resolver.migrations().clone();
        for extension in &self.extensions {
            extension.extend(&mut mappings);
        }
        mappings
    }

    /// Legacy calls forwarded since startup.
    pub fn redirect_count(&self) -> u64 {
        self.redirect_count.load(Ordering::Relaxed)
    }

    pub fn telemetry(&self) -> &Arc<DeprecationTelemetry> {
        &self.telemetry
    }

    /// Bind a shadow route for every mapping. Returns how many were bound.
    ///
    /// Runs after canonical routes exist. A mapping whose legacy key is already
    /// owned produces a registry conflict and is skipped.
    pub fn register_shadow_routes(
        self: &Arc<Self>,
        registry: &RouteRegistry,
    ) -> Result<usize, RegistryError> {
        let table = Arc::downgrade(registry.table());
        let mut bound = 0;

        for (legacy_route, canonical_route) in self.legacy_mappings() {
            let Some((namespace, path)) = self.resolver.split_route(&legacy_route) else {
                tracing::warn!(legacy = %legacy_route, "Skipping legacy mapping without a namespace");
                continue;
            };

            let methods = self.shadow_methods(registry, &canonical_route);
            let shadow = self.shadow_handler(table.clone(), legacy_route.clone(), canonical_route.clone());
            let registration = RouteRegistration::new(RouteKey::new(&namespace, &path), shadow)
                .methods(methods)
                .permission(allow_all())
                .module(COMPAT_MODULE)
                .group(LEGACY_GROUP)
                .deprecated();

            match registry.register(registration) {
                Ok(()) => bound += 1,
                Err(RegistryError::Conflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        tracing::info!(shadow_routes = bound, "Legacy shadow routes registered");
        Ok(bound)
    }

    /// Methods of the canonical registration, or every method when it is missing.
    fn shadow_methods(&self, registry: &RouteRegistry, canonical_route: &str) -> BTreeSet<HttpMethod> {
        let canonical = self
            .resolver
            .split_route(canonical_route)
            .and_then(|(ns, path)| registry.get_route(&RouteKey::new(&ns, &path)));

        match canonical {
            Some(registration) => registration.methods,
            None => {
                tracing::warn!(
                    canonical = %canonical_route,
                    "Legacy mapping targets a route that is not registered"
                );
                HttpMethod::ALL.iter().copied().collect()
            }
        }
    }

    fn shadow_handler(
        self: &Arc<Self>,
        table: Weak<RouteTable>,
        legacy_route: String,
        canonical_route: String,
    ) -> Handler {
        let dispatcher = Arc::clone(self);
        handler(move |request: ApiRequest| {
            let dispatcher = Arc::clone(&dispatcher);
            let table = table.clone();
            let legacy_route = legacy_route.clone();
            let canonical_route = canonical_route.clone();
            async move {
                Ok(dispatcher
                    .forward(table, &legacy_route, &canonical_route, request)
                    .await)
            }
        })
    }

    /// Rewrite a legacy call onto its canonical route and decorate the result.
    pub async fn forward(
        &self,
        table: Weak<RouteTable>,
        legacy_route: &str,
        canonical_route: &str,
        request: ApiRequest,
    ) -> ApiResponse {
        self.redirect_count.fetch_add(1, Ordering::Relaxed);
        metrics::record_legacy_redirect(legacy_route);
        self.telemetry
            .record_deprecation(legacy_route, canonical_route, &request);

        let target = substitute_placeholders(canonical_route, &request.path_params);
        let replacement_url = self.forwarded_url(&target, &request);

        tracing::debug!(
            legacy = %legacy_route,
            canonical = %canonical_route,
            target = %target,
            request_id = request.request_id().unwrap_or("-"),
            "Forwarding legacy request"
        );

        let internal = ApiRequest {
            method: request.method,
            route: target,
            namespace: None,
            query: request.query,
            body: request.body,
            headers: request.headers,
            path_params: request.path_params,
        };

        let mut response = match table.upgrade() {
            Some(table) => table.dispatch(internal).await,
            None => ApiResponse::from(ApiError::Forwarding {
                legacy_route: legacy_route.to_string(),
                replacement: canonical_route.to_string(),
                reason: "route table is gone".to_string(),
            }),
        };

        self.notice(legacy_route, canonical_route, replacement_url)
            .apply(&mut response);
        response
    }

    fn forwarded_url(&self, target: &str, request: &ApiRequest) -> String {
        let query = request.query_string();
        if query.is_empty() {
            format!("{}/{}", self.options.public_base_url, target)
        } else {
            format!("{}/{}?{}", self.options.public_base_url, target, query)
        }
    }

    fn notice(&self, legacy_route: &str, canonical_route: &str, replacement_url: String) -> DeprecationNotice {
        DeprecationNotice {
            legacy_route: legacy_route.to_string(),
            replacement: canonical_route.to_string(),
            replacement_url,
            sunset: self.options.sunset,
            documentation: format!(
                "{}/{}",
                self.options.public_base_url,
                self.resolver.qualify("discover")
            ),
        }
    }
}
