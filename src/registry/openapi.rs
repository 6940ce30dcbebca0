//! OpenAPI-shaped documentation derived from the catalog.
//!
//! Purely a documentation artifact; dispatch never reads it.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};

use crate::registry::catalog::{RouteRegistration, RouteRegistry};
use crate::routing::matcher::PathPattern;

impl RouteRegistry {
    /// Build an OpenAPI 3 document with one operation per route/method pair.
    pub fn generate_api_spec(&self) -> Value {
        let state = self.snapshot();
        let mut paths = Map::new();
        let mut used_ids = BTreeSet::new();

        for (key, registration) in &state.routes {
            let pattern = PathPattern::parse(key.path()).ok();
            let parameters: Vec<Value> = pattern
                .as_ref()
                .map(|p| p.placeholders())
                .unwrap_or_default()
                .into_iter()
                .map(|name| {
                    json!({
                        "name": name,
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string" },
                    })
                })
                .collect();

            let mut operations = Map::new();
            for method in &registration.methods {
                let base = operation_id(&key.full(), method.as_str());
                let id = unique_id(base, &mut used_ids);
                operations.insert(
                    method.as_str().to_lowercase(),
                    operation(registration, id, &parameters),
                );
            }
            paths.insert(format!("/{}", key.full()), Value::Object(operations));
        }

        let info = self.info();
        json!({
            "openapi": "3.0.3",
            "info": {
                "title": info.title,
                "version": info.version,
                "description": info.description,
            },
            "tags": self.groups().into_iter().map(|g| json!({ "name": g })).collect::<Vec<_>>(),
            "paths": paths,
        })
    }
}

fn operation(registration: &RouteRegistration, id: String, parameters: &[Value]) -> Value {
    let mut op = json!({
        "operationId": id,
        "tags": [registration.group],
        "x-owning-module": registration.owning_module,
        "responses": {
            "200": { "description": "Successful response" },
        },
    });
    if !parameters.is_empty() {
        op["parameters"] = Value::Array(parameters.to_vec());
    }
    if registration.deprecated {
        op["deprecated"] = Value::Bool(true);
    }
    op
}

/// `get_app_v1_events`: method first, literal segments slugified, placeholders dropped.
pub fn operation_id(route: &str, method: &str) -> String {
    let slug = route
        .split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .map(slugify)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}", method.to_lowercase(), slug)
}

fn slugify(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Placeholder stripping can collide (`events` vs `events/{id}`); later ids get a numeric suffix.
fn unique_id(base: String, used: &mut BTreeSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
