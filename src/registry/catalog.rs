//! The route catalog: one registration per route key, conflicts recorded.
//!
//! # Responsibilities
//! - Validate and store route registrations, binding each on the route table
//! - Reject duplicate keys (first registrant wins) and record the conflict
//! - Keep named controller handles for later lookup
//! - Reconcile against routes bound directly on the table (`untracked`)
//!
//! # Design Decisions
//! - Writers are serialized and publish a fresh snapshot; readers never lock
//! - A rejected registration is never bound, so the winner keeps serving
//! - Conflicts are append-only and never deduplicated

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{ApiError, RegistryError};
use crate::http::{ApiRequest, HttpMethod};
use crate::observability::metrics;
use crate::registry::key::RouteKey;
use crate::routing::{handler, Handler, PermissionCheck, RouteTable};

/// Group assigned to routes found on the table but never registered here.
pub const UNTRACKED_GROUP: &str = "untracked";

/// Owning module recorded for untracked routes.
pub const UNKNOWN_MODULE: &str = "unknown";

/// A route registration.
#[derive(Clone)]
pub struct RouteRegistration {
    pub route_key: RouteKey,
    pub methods: BTreeSet<HttpMethod>,
    pub handler: Handler,
    pub permission_check: Option<PermissionCheck>,
    pub owning_module: String,
    pub group: String,
    /// Marks documentation output only; dispatch ignores it.
    pub deprecated: bool,
}

impl RouteRegistration {
    /// A GET route owned by `"core"` in group `"default"`; refine with the builder methods.
    pub fn new(route_key: RouteKey, handler: Handler) -> Self {
        Self {
            route_key,
            methods: BTreeSet::from([HttpMethod::Get]),
            handler,
            permission_check: None,
            owning_module: "core".to_string(),
            group: "default".to_string(),
            deprecated: false,
        }
    }

    pub fn methods<I: IntoIterator<Item = HttpMethod>>(mut self, methods: I) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn permission(mut self, check: PermissionCheck) -> Self {
        self.permission_check = Some(check);
        self
    }

    pub fn module(mut self, owning_module: impl Into<String>) -> Self {
        self.owning_module = owning_module.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Serializable summary used by discovery.
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            route: self.route_key.full(),
            methods: self.methods.clone(),
            owning_module: self.owning_module.clone(),
            group: self.group.clone(),
        }
    }
}

impl std::fmt::Debug for RouteRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistration")
            .field("route_key", &self.route_key)
            .field("methods", &self.methods)
            .field("owning_module", &self.owning_module)
            .field("group", &self.group)
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

/// What discovery reports for one route.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteInfo {
    pub route: String,
    pub methods: BTreeSet<HttpMethod>,
    pub owning_module: String,
    pub group: String,
}

/// A rejected attempt to register a key that is already owned.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Conflict {
    pub route_key: RouteKey,
    pub attempted_by: String,
    pub held_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Object-safe access to the concrete controller type.
pub trait AsAny {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A named handle other subsystems can look up.
///
/// Controllers that bind their own routes override `register_routes`; the
/// default does nothing.
pub trait Controller: AsAny + Send + Sync {
    fn register_routes(&self, _registry: &RouteRegistry) -> Result<(), RegistryError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct RegistryState {
    pub(crate) routes: BTreeMap<RouteKey, RouteRegistration>,
    pub(crate) groups: BTreeMap<String, Vec<RouteKey>>,
    pub(crate) conflicts: Vec<Conflict>,
    controllers: BTreeMap<String, Arc<dyn Controller>>,
}

impl RegistryState {
    /// The registration serving the same requests as `key`, under any namespace split.
    fn owner_of(&self, key: &RouteKey) -> Option<&RouteRegistration> {
        self.routes.get(key).or_else(|| {
            let shape = key.shape();
            self.routes.values().find(|r| r.route_key.shape() == shape)
        })
    }
}

/// Descriptive metadata for generated API documents.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Default for ApiInfo {
    fn default() -> Self {
        Self {
            title: "REST API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Routes published through the route registry".to_string(),
        }
    }
}

/// The route registry. One per process, owned by the composition root.
pub struct RouteRegistry {
    state: ArcSwap<RegistryState>,
    writer: Mutex<()>,
    table: Arc<RouteTable>,
    info: ApiInfo,
}

impl RouteRegistry {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            state: ArcSwap::from_pointee(RegistryState::default()),
            writer: Mutex::new(()),
            table,
            info: ApiInfo::default(),
        }
    }

    pub fn with_info(mut self, info: ApiInfo) -> Self {
        self.info = info;
        self
    }

    pub fn info(&self) -> &ApiInfo {
        &self.info
    }

    /// The table registrations are bound on.
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Register and bind a route. The first registrant of a key wins.
    pub fn register(&self, registration: RouteRegistration) -> Result<(), RegistryError> {
        registration.route_key.validate()?;
        if registration.methods.is_empty() {
            return Err(RegistryError::NoMethods(registration.route_key));
        }

        let _writer = self.writer.lock();
        let current = self.state.load_full();
        let key = registration.route_key.clone();

        if let Some(existing) = current.owner_of(&key) {
            let conflict = Conflict {
                route_key: key.clone(),
                attempted_by: registration.owning_module.clone(),
                held_by: existing.owning_module.clone(),
                timestamp: Utc::now(),
            };

            tracing::warn!(
                route = %key,
                held_route = %existing.route_key,
                attempted_by = %conflict.attempted_by,
                held_by = %conflict.held_by,
                "Route registration conflict; keeping existing registration"
            );
            metrics::record_conflict(&conflict.attempted_by);

            let mut next = RegistryState::clone(&current);
            next.conflicts.push(conflict.clone());
            self.state.store(Arc::new(next));

            return Err(RegistryError::Conflict {
                route_key: key,
                attempted_by: conflict.attempted_by,
                held_by: conflict.held_by,
            });
        }

        self.table.bind(
            key.namespace(),
            key.path(),
            registration.methods.clone(),
            Arc::clone(&registration.handler),
            registration.permission_check.clone(),
        )?;

        tracing::debug!(
            route = %key,
            module = %registration.owning_module,
            group = %registration.group,
            "Route registered"
        );

        let mut next = RegistryState::clone(&current);
        next.groups
            .entry(registration.group.clone())
            .or_default()
            .push(key.clone());
        next.routes.insert(key, registration);
        metrics::record_route_count(next.routes.len());
        self.state.store(Arc::new(next));
        Ok(())
    }

    /// Store a named controller and let it bind its own routes.
    pub fn register_controller(
        &self,
        name: &str,
        controller: Arc<dyn Controller>,
    ) -> Result<(), RegistryError> {
        {
            let _writer = self.writer.lock();
            let mut next = RegistryState::clone(&self.state.load_full());
            if next.controllers.contains_key(name) {
                tracing::warn!(controller = name, "Replacing previously registered controller");
            }
            next.controllers
                .insert(name.to_string(), Arc::clone(&controller));
            self.state.store(Arc::new(next));
        }

        // The writer lock is released above; self-registration calls `register`.
        controller.register_routes(self)
    }

    pub fn get_controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.state.load().controllers.get(name).cloned()
    }

    /// Look up a controller and downcast it to its concrete type.
    pub fn get_controller_as<T: Controller + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get_controller(name)?.into_any().downcast::<T>().ok()
    }

    pub fn get_routes(&self) -> BTreeMap<RouteKey, RouteRegistration> {
        self.state.load().routes.clone()
    }

    pub fn get_routes_by_group(&self, group: &str) -> BTreeMap<RouteKey, RouteRegistration> {
        self.filtered(|r| r.group == group)
    }

    pub fn get_routes_by_plugin(&self, owning_module: &str) -> BTreeMap<RouteKey, RouteRegistration> {
        self.filtered(|r| r.owning_module == owning_module)
    }

    pub fn has_route(&self, route_key: &RouteKey) -> bool {
        self.state.load().routes.contains_key(route_key)
    }

    pub fn get_route(&self, route_key: &RouteKey) -> Option<RouteRegistration> {
        self.state.load().routes.get(route_key).cloned()
    }

    pub fn get_conflicts(&self) -> Vec<Conflict> {
        self.state.load().conflicts.clone()
    }

    /// Group names in sorted order.
    pub fn groups(&self) -> Vec<String> {
        self.state.load().groups.keys().cloned().collect()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.state.load().groups.contains_key(group)
    }

    pub fn route_count(&self) -> usize {
        self.state.load().routes.len()
    }

    pub(crate) fn snapshot(&self) -> Arc<RegistryState> {
        self.state.load_full()
    }

    /// Add an `untracked` entry for every table route that bypassed the registry.
    ///
    /// Returns the number of entries added.
    pub fn collect_untracked(&self) -> usize {
        let _writer = self.writer.lock();
        let current = self.state.load_full();
        let mut next = RegistryState::clone(&current);
        let mut added = 0;

        for bound in self.table.routes() {
            let key = RouteKey::new(&bound.namespace, &bound.pattern);
            if next.owner_of(&key).is_some() {
                continue;
            }

            tracing::info!(route = %key, "Found route bound outside the registry");
            let registration = RouteRegistration {
                route_key: key.clone(),
                methods: bound.methods,
                handler: delegate_to_table(Arc::downgrade(&self.table)),
                permission_check: None,
                owning_module: UNKNOWN_MODULE.to_string(),
                group: UNTRACKED_GROUP.to_string(),
                deprecated: false,
            };
            next.groups
                .entry(UNTRACKED_GROUP.to_string())
                .or_default()
                .push(key.clone());
            next.routes.insert(key, registration);
            added += 1;
        }

        if added > 0 {
            metrics::record_route_count(next.routes.len());
            self.state.store(Arc::new(next));
        }
        added
    }

    fn filtered<F>(&self, keep: F) -> BTreeMap<RouteKey, RouteRegistration>
    where
        F: Fn(&RouteRegistration) -> bool,
    {
        self.state
            .load()
            .routes
            .iter()
            .filter(|(_, r)| keep(r))
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect()
    }
}

/// Handler for untracked entries: dispatches through the table that actually serves them.
fn delegate_to_table(table: Weak<RouteTable>) -> Handler {
    handler(move |request: ApiRequest| {
        let table = table.clone();
        async move {
            let table = table
                .upgrade()
                .ok_or_else(|| ApiError::Internal("route table dropped".to_string()))?;
            Ok(table.dispatch(request).await)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiResponse;
    use serde_json::json;

    fn ok_handler(tag: &'static str) -> Handler {
        handler(move |_req| async move { Ok(ApiResponse::ok(json!({ "from": tag }))) })
    }

    fn registry() -> RouteRegistry {
        RouteRegistry::new(Arc::new(RouteTable::new()))
    }

    fn events(module: &str, tag: &'static str) -> RouteRegistration {
        RouteRegistration::new(RouteKey::new("app/v1", "events"), ok_handler(tag))
            .module(module)
            .group("events")
    }

    #[test]
    fn test_register_binds_route() {
        let registry = registry();
        registry.register(events("a", "a")).unwrap();

        assert!(registry.has_route(&RouteKey::new("app/v1", "events")));
        assert_eq!(registry.table().len(), 1);
        assert_eq!(registry.groups(), vec!["events"]);
    }

    #[tokio::test]
    async fn test_first_registrant_wins() {
        let registry = registry();
        registry.register(events("a", "a")).unwrap();

        let err = registry.register(events("b", "b")).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { ref held_by, .. } if held_by == "a"));

        let routes = registry.get_routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[&RouteKey::new("app/v1", "events")].owning_module, "a");

        let conflicts = registry.get_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].attempted_by, "b");
        assert_eq!(conflicts[0].held_by, "a");

        // The loser was never bound.
        assert_eq!(registry.table().len(), 1);
        let resp = registry
            .table()
            .dispatch(ApiRequest::new(HttpMethod::Get, "app/v1/events"))
            .await;
        assert_eq!(resp.body["from"], "a");
    }

    #[test]
    fn test_same_url_under_another_namespace_split_conflicts() {
        let registry = registry();
        registry.register(events("a", "a")).unwrap();

        let split = RouteRegistration::new(RouteKey::new("app", "v1/events"), ok_handler("b"))
            .module("b")
            .group("events");
        let err = registry.register(split).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { ref held_by, .. } if held_by == "a"));

        let by_id = RouteRegistration::new(RouteKey::new("app/v1", "events/{id}"), ok_handler("a"));
        registry.register(by_id.module("a")).unwrap();
        let renamed =
            RouteRegistration::new(RouteKey::new("app/v1", "events/{event_id}"), ok_handler("c"));
        assert!(registry.register(renamed.module("c")).is_err());

        assert_eq!(registry.get_routes().len(), 2);
        assert_eq!(registry.get_conflicts().len(), 2);
        assert_eq!(registry.get_conflicts()[0].route_key, RouteKey::new("app", "v1/events"));
        assert_eq!(registry.get_statistics().total_conflicts, 2);
        assert_eq!(registry.table().len(), 2);
    }

    #[test]
    fn test_repeated_conflicts_are_not_deduplicated() {
        let registry = registry();
        registry.register(events("a", "a")).unwrap();
        for _ in 0..3 {
            assert!(registry.register(events("b", "b")).is_err());
        }
        assert_eq!(registry.get_conflicts().len(), 3);
    }

    #[test]
    fn test_invalid_registrations_are_rejected() {
        let registry = registry();
        let bad_key = RouteRegistration::new(RouteKey::new("app/v1", "events/{id"), ok_handler("x"));
        assert!(matches!(
            registry.register(bad_key),
            Err(RegistryError::InvalidRouteKey { .. })
        ));

        let no_methods = events("a", "a").methods([]);
        assert!(matches!(
            registry.register(no_methods),
            Err(RegistryError::NoMethods(_))
        ));
        assert_eq!(registry.route_count(), 0);
        assert!(registry.get_conflicts().is_empty());
    }

    #[test]
    fn test_projections() {
        let registry = registry();
        registry.register(events("events-mod", "1")).unwrap();
        registry
            .register(
                RouteRegistration::new(RouteKey::new("app/v1", "social/feed"), ok_handler("2"))
                    .module("social-mod")
                    .group("social"),
            )
            .unwrap();

        assert_eq!(registry.get_routes_by_group("social").len(), 1);
        assert_eq!(registry.get_routes_by_group("nope").len(), 0);
        assert_eq!(registry.get_routes_by_plugin("events-mod").len(), 1);
        assert!(registry.has_group("events"));
        assert_eq!(
            registry.get_route(&RouteKey::new("app/v1", "social/feed")).unwrap().info().route,
            "app/v1/social/feed"
        );
    }

    #[tokio::test]
    async fn test_collect_untracked() {
        let registry = registry();
        registry.register(events("a", "a")).unwrap();
        registry
            .table()
            .bind(
                "app/v1",
                "direct",
                BTreeSet::from([HttpMethod::Get]),
                ok_handler("direct"),
                None,
            )
            .unwrap();

        assert_eq!(registry.collect_untracked(), 1);
        assert_eq!(registry.collect_untracked(), 0);

        let untracked = registry.get_routes_by_group(UNTRACKED_GROUP);
        let entry = &untracked[&RouteKey::new("app/v1", "direct")];
        assert_eq!(entry.owning_module, UNKNOWN_MODULE);

        let resp = (entry.handler)(ApiRequest::new(HttpMethod::Get, "app/v1/direct"))
            .await
            .unwrap();
        assert_eq!(resp.body["from"], "direct");
    }

    struct EventsController {
        label: &'static str,
    }

    impl Controller for EventsController {
        fn register_routes(&self, registry: &RouteRegistry) -> Result<(), RegistryError> {
            registry.register(events("events-controller", self.label))
        }
    }

    struct HandleOnly;

    impl Controller for HandleOnly {}

    #[test]
    fn test_controllers() {
        let registry = registry();
        registry
            .register_controller("events", Arc::new(EventsController { label: "ctl" }))
            .unwrap();
        registry.register_controller("plain", Arc::new(HandleOnly)).unwrap();

        assert!(registry.has_route(&RouteKey::new("app/v1", "events")));
        assert_eq!(registry.route_count(), 1);
        assert!(registry.get_controller("plain").is_some());
        assert!(registry.get_controller("missing").is_none());

        let typed = registry.get_controller_as::<EventsController>("events").unwrap();
        assert_eq!(typed.label, "ctl");
        assert!(registry.get_controller_as::<HandleOnly>("events").is_none());
    }
}
