//! Aggregate statistics over the catalog.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::catalog::RouteRegistry;

/// Counts computed on demand by folding over the route map.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_routes: usize,
    pub total_conflicts: usize,
    pub by_owning_module: BTreeMap<String, usize>,
    pub by_method: BTreeMap<String, usize>,
    pub by_group: BTreeMap<String, usize>,
}

impl RouteRegistry {
    /// O(n) in route count; not meant for the request hot path.
    pub fn get_statistics(&self) -> RegistryStats {
        let state = self.snapshot();
        let mut stats = RegistryStats {
            total_routes: state.routes.len(),
            total_conflicts: state.conflicts.len(),
            ..RegistryStats::default()
        };

        for registration in state.routes.values() {
            *stats
                .by_owning_module
                .entry(registration.owning_module.clone())
                .or_default() += 1;
            *stats
                .by_group
                .entry(registration.group.clone())
                .or_default() += 1;
            for method in &registration.methods {
                *stats.by_method.entry(method.to_string()).or_default() += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::http::{ApiResponse, HttpMethod};
    use crate::registry::{RouteKey, RouteRegistration, RouteRegistry};
    use crate::routing::{handler, RouteTable};

    fn route(path: &str, module: &str, group: &str, methods: &[HttpMethod]) -> RouteRegistration {
        RouteRegistration::new(
            RouteKey::new("app/v1", path),
            handler(|_| async { Ok(ApiResponse::ok(json!([]))) }),
        )
        .methods(methods.iter().copied())
        .module(module)
        .group(group)
    }

    #[test]
    fn test_empty_registry() {
        let registry = RouteRegistry::new(Arc::new(RouteTable::new()));
        let stats = registry.get_statistics();
        assert_eq!(stats.total_routes, 0);
        assert_eq!(stats.total_conflicts, 0);
        assert!(stats.by_group.is_empty());
    }

    #[test]
    fn test_counts_by_dimension() {
        let registry = RouteRegistry::new(Arc::new(RouteTable::new()));
        registry
            .register(route("events", "a", "events", &[HttpMethod::Get, HttpMethod::Post]))
            .unwrap();
        registry
            .register(route("events/{id}", "a", "events", &[HttpMethod::Get]))
            .unwrap();
        registry
            .register(route("social/feed", "b", "social", &[HttpMethod::Get]))
            .unwrap();
        let _ = registry.register(route("events", "b", "events", &[HttpMethod::Get]));

        let stats = registry.get_statistics();
        assert_eq!(stats.total_routes, 3);
        assert_eq!(stats.total_conflicts, 1);
        assert_eq!(stats.by_owning_module["a"], 2);
        assert_eq!(stats.by_owning_module["b"], 1);
        assert_eq!(stats.by_method["GET"], 3);
        assert_eq!(stats.by_method["POST"], 1);
        assert_eq!(stats.by_group["events"], 2);
    }
}
