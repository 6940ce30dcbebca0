//! Route table and in-process dispatch.
//!
//! # Responsibilities
//! - Bind routes (namespace, pattern, methods, handler, permission check)
//! - Look up the route for a request and resolve its path parameters
//! - Run permission checks, the handler, and post-dispatch response hooks
//!
//! # Design Decisions
//! - Lock-free reads (`ArcSwap`); binds are serialized by a writer lock
//! - First bound route wins when patterns overlap
//! - Explicit 404/405 rather than a silent default route
//! - Hooks run for every response, errors included

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use crate::error::{ApiError, RegistryError};
use crate::http::request::normalize_path;
use crate::http::{ApiRequest, ApiResponse, HttpMethod};
use crate::routing::matcher::PathPattern;

/// Future returned by route handlers.
pub type HandlerFuture = BoxFuture<'static, Result<ApiResponse, ApiError>>;

/// An async route handler.
pub type Handler = Arc<dyn Fn(ApiRequest) -> HandlerFuture + Send + Sync>;

/// Decides whether a request may reach its handler.
///
/// `Ok(false)` denies with 403; an `Err` is returned to the caller as-is.
pub type PermissionCheck = Arc<dyn Fn(&ApiRequest) -> Result<bool, ApiError> + Send + Sync>;

/// Wrap an async function as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
{
    Arc::new(move |req| -> HandlerFuture { Box::pin(f(req)) })
}

/// Wrap a closure as a [`PermissionCheck`].
pub fn permission<F>(f: F) -> PermissionCheck
where
    F: Fn(&ApiRequest) -> Result<bool, ApiError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A permission check that admits every request.
pub fn allow_all() -> PermissionCheck {
    Arc::new(|_| Ok(true))
}

/// Observes every response right before it leaves the table.
pub trait ResponseHook: Send + Sync {
    /// `namespace` is the namespace the request resolved to, if any.
    fn on_response(&self, namespace: Option<&str>, route: &str, response: &mut ApiResponse);
}

/// A route as bound on the table.
pub struct BoundRoute {
    pub namespace: String,
    pub pattern: String,
    pub methods: BTreeSet<HttpMethod>,
    full: PathPattern,
    handler: Handler,
    permission: Option<PermissionCheck>,
}

impl BoundRoute {
    fn allows(&self, method: HttpMethod) -> bool {
        self.methods.contains(&method)
            || (method == HttpMethod::Head && self.methods.contains(&HttpMethod::Get))
    }
}

impl std::fmt::Debug for BoundRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundRoute")
            .field("namespace", &self.namespace)
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Read-only view of a bound route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRouteInfo {
    pub namespace: String,
    pub pattern: String,
    pub methods: BTreeSet<HttpMethod>,
}

/// The host route table.
#[derive(Default)]
pub struct RouteTable {
    routes: ArcSwap<Vec<Arc<BoundRoute>>>,
    hooks: ArcSwap<Vec<Arc<dyn ResponseHook>>>,
    writer: Mutex<()>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a route reachable.
    pub fn bind(
        &self,
        namespace: &str,
        pattern: &str,
        methods: BTreeSet<HttpMethod>,
        handler: Handler,
        permission: Option<PermissionCheck>,
    ) -> Result<(), RegistryError> {
        let full_route = format!("{}/{}", namespace, pattern);
        let full = PathPattern::parse(&full_route).map_err(|reason| {
            RegistryError::InvalidRouteKey {
                route: full_route.clone(),
                reason,
            }
        })?;

        let route = Arc::new(BoundRoute {
            namespace: namespace.to_string(),
            pattern: pattern.to_string(),
            methods,
            full,
            handler,
            permission,
        });

        let _writer = self.writer.lock();
        let mut next = Vec::clone(&self.routes.load_full());
        next.push(route);
        self.routes.store(Arc::new(next));

        tracing::trace!(route = %full_route, "Route bound");
        Ok(())
    }

    /// Register a hook that runs after every dispatch.
    pub fn add_hook(&self, hook: Arc<dyn ResponseHook>) {
        let _writer = self.writer.lock();
        let mut next = Vec::clone(&self.hooks.load_full());
        next.push(hook);
        self.hooks.store(Arc::new(next));
    }

    /// Every bound route, in bind order.
    pub fn routes(&self) -> Vec<BoundRouteInfo> {
        self.routes
            .load()
            .iter()
            .map(|r| BoundRouteInfo {
                namespace: r.namespace.clone(),
                pattern: r.pattern.clone(),
                methods: r.methods.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Longest bound namespace that prefixes `route`.
    pub fn namespace_of(&self, route: &str) -> Option<String> {
        self.routes
            .load()
            .iter()
            .map(|r| r.namespace.as_str())
            .filter(|ns| route == *ns || route.starts_with(&format!("{}/", ns)))
            .max_by_key(|ns| ns.len())
            .map(str::to_string)
    }

    /// Dispatch a request exactly as if it arrived from the network.
    pub fn dispatch(&self, mut request: ApiRequest) -> BoxFuture<'_, ApiResponse> {
        Box::pin(async move {
            let (route, params) = match self.resolve(&request) {
                Ok(found) => found,
                Err(err) => {
                    let namespace = self.namespace_of(&request.route);
                    let mut response = ApiResponse::from(err);
                    self.run_hooks(namespace.as_deref(), &request.route, &mut response);
                    return response;
                }
            };

            request.namespace = Some(route.namespace.clone());
            request.path_params.extend(params);
            let route_path = request.route.clone();

            let allowed = match &route.permission {
                Some(check) => check(&request),
                None => Ok(true),
            };

            let mut response = match allowed {
                Ok(true) => match (route.handler)(request).await {
                    Ok(response) => response,
                    Err(err) => {
                        tracing::debug!(route = %route_path, error = %err, "Handler returned error");
                        ApiResponse::from(err)
                    }
                },
                Ok(false) => ApiResponse::from(ApiError::Forbidden),
                Err(err) => ApiResponse::from(err),
            };

            self.run_hooks(Some(&route.namespace), &route_path, &mut response);
            response
        })
    }

    fn resolve(
        &self,
        request: &ApiRequest,
    ) -> Result<(Arc<BoundRoute>, BTreeMap<String, String>), ApiError> {
        let routes = self.routes.load_full();
        let mut path_matched = false;

        for route in routes.iter() {
            if let Some(params) = route.full.matches(&request.route) {
                if route.allows(request.method) {
                    return Ok((Arc::clone(route), params));
                }
                path_matched = true;
            }
        }

        if path_matched {
            Err(ApiError::MethodNotAllowed)
        } else {
            Err(ApiError::NoRoute)
        }
    }

    /// Answer a request that never reached dispatch, still running response hooks.
    pub fn reject(&self, route: &str, err: ApiError) -> ApiResponse {
        let route = normalize_path(route);
        let mut response = ApiResponse::from(err);
        self.run_hooks(self.namespace_of(&route).as_deref(), &route, &mut response);
        response
    }

    fn run_hooks(&self, namespace: Option<&str>, route: &str, response: &mut ApiResponse) {
        for hook in self.hooks.load().iter() {
            hook.on_response(namespace, route, response);
        }
    }
}
