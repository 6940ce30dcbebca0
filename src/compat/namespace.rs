//! Namespace-level deprecation flagging.

use std::sync::Arc;

use crate::compat::headers::flag_namespace;
use crate::http::ApiResponse;
use crate::namespace::NamespaceResolver;
use crate::routing::ResponseHook;

/// Flags every response served from a legacy namespace, mapped or not.
pub struct NamespaceDeprecationHook {
    resolver: Arc<NamespaceResolver>,
}

impl NamespaceDeprecationHook {
    pub fn new(resolver: Arc<NamespaceResolver>) -> Self {
        Self { resolver }
    }
}

impl ResponseHook for NamespaceDeprecationHook {
    fn on_response(&self, namespace: Option<&str>, route: &str, response: &mut ApiResponse) {
        let legacy = match namespace {
            Some(ns) if self.resolver.is_legacy(ns) => true,
            // Unmatched requests only know the namespace the table guessed.
            _ => self.resolver.legacy_namespace_of(route).is_some(),
        };

        if legacy {
            flag_namespace(response, self.resolver.canonical());
        }
    }
}
