//! Namespace lookups and legacy path migration.
//!
//! # Responsibilities
//! - Expose the canonical namespace and the legacy alias set
//! - Map logical groups to path prefixes
//! - Exact-match legacy routes to their canonical replacement
//!
//! # Design Decisions
//! - Built once at startup, never mutated afterwards (shared via `Arc`)
//! - Absent entries answer `None`/`false`; lookups never fail

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{CompatConfig, NamespaceConfig};
use crate::http::request::normalize_path;
use crate::namespace::migrations;

/// Resolves namespaces and legacy routes.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    canonical: String,
    legacy: BTreeSet<String>,
    prefixes: BTreeMap<String, String>,
    migrations: BTreeMap<String, String>,
}

impl NamespaceResolver {
    /// A resolver with no group prefixes and no migrations.
    pub fn new<I, S>(canonical: &str, legacy: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            canonical: normalize_path(canonical),
            legacy: legacy
                .into_iter()
                .map(|ns| normalize_path(ns.as_ref()))
                .filter(|ns| !ns.is_empty())
                .collect(),
            prefixes: BTreeMap::new(),
            migrations: BTreeMap::new(),
        }
    }

    /// Build from configuration: namespaces, prefixes, built-in and extra mappings.
    pub fn from_config(namespace: &NamespaceConfig, compat: &CompatConfig) -> Self {
        let mut resolver = Self::new(&namespace.canonical, &namespace.legacy);
        for (group, prefix) in &namespace.group_prefixes {
            resolver = resolver.with_group_prefix(group, prefix);
        }
        if compat.builtin_mappings {
            resolver = resolver.with_builtin_migrations();
        }
        for mapping in &compat.extra_mappings {
            resolver = resolver.with_migration(&mapping.legacy, &mapping.canonical);
        }
        resolver
    }

    pub fn with_group_prefix(mut self, group: &str, prefix: &str) -> Self {
        self.prefixes
            .insert(group.to_string(), normalize_path(prefix));
        self
    }

    /// Add one exact legacy -> canonical mapping. Later entries replace earlier ones.
    pub fn with_migration(mut self, legacy_route: &str, canonical_route: &str) -> Self {
        self.migrations.insert(
            normalize_path(legacy_route),
            normalize_path(canonical_route),
        );
        self
    }

    /// Merge the built-in buckets, qualifying canonical paths with this resolver's namespace.
    pub fn with_builtin_migrations(mut self) -> Self {
        for entry in migrations::builtin() {
            let legacy_ns = entry
                .legacy_namespace
                .map(str::to_string)
                .unwrap_or_else(|| self.canonical.clone());
            let legacy_route = format!("{}/{}", legacy_ns, entry.legacy_path);
            let canonical_route = self.qualify(entry.canonical_path);
            self.migrations.insert(legacy_route, canonical_route);
        }
        self
    }

    /// The current canonical namespace.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn legacy_namespaces(&self) -> impl Iterator<Item = &str> {
        self.legacy.iter().map(String::as_str)
    }

    pub fn is_legacy(&self, namespace: &str) -> bool {
        self.legacy.contains(&normalize_path(namespace))
    }

    /// Exact-match lookup of a full legacy route.
    pub fn migrate(&self, legacy_full_route: &str) -> Option<&str> {
        self.migrations
            .get(&normalize_path(legacy_full_route))
            .map(String::as_str)
    }

    /// Prefix a bare path with the canonical namespace.
    pub fn qualify(&self, path: &str) -> String {
        let path = normalize_path(path);
        if path.is_empty() {
            self.canonical.clone()
        } else {
            format!("{}/{}", self.canonical, path)
        }
    }

    /// Path prefix for a logical group.
    pub fn prefix_for(&self, group: &str) -> Option<&str> {
        self.prefixes.get(group).map(String::as_str)
    }

    /// Group whose prefix owns the given path (relative to its namespace).
    pub fn group_for_path(&self, path: &str) -> Option<&str> {
        let path = normalize_path(path);
        self.prefixes
            .iter()
            .filter(|(_, prefix)| path == **prefix || path.starts_with(&format!("{}/", prefix)))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(group, _)| group.as_str())
    }

    /// The legacy namespace a full route lives under, if any.
    pub fn legacy_namespace_of(&self, route: &str) -> Option<&str> {
        let route = normalize_path(route);
        self.legacy
            .iter()
            .filter(|ns| route == **ns || route.starts_with(&format!("{}/", ns)))
            .max_by_key(|ns| ns.len())
            .map(String::as_str)
    }

    /// Split a full route into `(namespace, path)`.
    ///
    /// Known namespaces win; otherwise the first two segments form the namespace.
    pub fn split_route(&self, route: &str) -> Option<(String, String)> {
        let route = normalize_path(route);
        let known = std::iter::once(&self.canonical)
            .chain(self.legacy.iter())
            .filter(|ns| route.starts_with(&format!("{}/", ns)))
            .max_by_key(|ns| ns.len());

        if let Some(ns) = known {
            let path = route[ns.len() + 1..].to_string();
            return Some((ns.clone(), path));
        }

        let mut parts = route.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(vendor), Some(version), Some(path)) if !path.is_empty() => {
                Some((format!("{}/{}", vendor, version), path.to_string()))
            }
            _ => None,
        }
    }

    /// The full migration table, legacy route -> canonical route.
    pub fn migrations(&self) -> &BTreeMap<String, String> {
        &self.migrations
    }
}
