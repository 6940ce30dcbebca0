//! Route keys.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::RegistryError;
use crate::http::request::normalize_path;
use crate::routing::matcher::PathPattern;

/// `(namespace, path_pattern)`, normalized without leading or trailing slashes.
///
/// Placeholders are kept verbatim, e.g. `app/v1` + `events/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
    namespace: String,
    path: String,
}

impl RouteKey {
    pub fn new(namespace: &str, path: &str) -> Self {
        Self {
            namespace: normalize_path(namespace),
            path: normalize_path(path),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `namespace/path`.
    pub fn full(&self) -> String {
        self.to_string()
    }

    /// The URL shape this key serves: the full route with every placeholder
    /// written as `{}`. Keys with equal shapes match the same requests.
    pub fn shape(&self) -> String {
        self.full()
            .split('/')
            .map(|segment| if segment.starts_with('{') { "{}" } else { segment })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Check the key can be bound.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidRouteKey {
            route: self.full(),
            reason,
        };

        if self.namespace.is_empty() {
            return Err(invalid("namespace is empty".to_string()));
        }
        if self.path.is_empty() {
            return Err(invalid("path is empty".to_string()));
        }
        if self.namespace.contains('{') || self.namespace.contains('}') {
            return Err(invalid("namespace cannot contain placeholders".to_string()));
        }
        PathPattern::parse(&self.path).map(|_| ()).map_err(invalid)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.path)
    }
}

impl Serialize for RouteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
