//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check namespaces and mapping routes are well-formed
//! - Validate value ranges (intervals > 0, addresses parse)
//! - Reject mappings that would forward into a legacy namespace
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RegistryConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::RegistryConfig;
use crate::http::request::normalize_path;
use crate::routing::matcher::PathPattern;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("namespace.canonical is invalid: {0}")]
    CanonicalNamespace(String),

    #[error("namespace.legacy entry {0:?} is invalid: {1}")]
    LegacyNamespace(String, String),

    #[error("namespace {0:?} is both canonical and legacy")]
    CanonicalIsLegacy(String),

    #[error("compat.public_base_url {0:?} is not a valid URL")]
    PublicBaseUrl(String),

    #[error("compat.extra_mappings entry {legacy:?} -> {canonical:?}: {reason}")]
    Mapping {
        legacy: String,
        canonical: String,
        reason: String,
    },

    #[error("telemetry.{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("telemetry.caller_header {0:?} is not a valid header name")]
    CallerHeader(String),

    #[error("{field} {value:?} is not a valid socket address")]
    Address { field: &'static str, value: String },

    #[error("admin.api_key must not be empty")]
    EmptyApiKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let canonical = normalize_path(&config.namespace.canonical);
    if let Err(reason) = check_namespace(&canonical) {
        errors.push(ValidationError::CanonicalNamespace(reason));
    }

    let mut legacy = BTreeSet::new();
    for raw in &config.namespace.legacy {
        let ns = normalize_path(raw);
        if let Err(reason) = check_namespace(&ns) {
            errors.push(ValidationError::LegacyNamespace(raw.clone(), reason));
            continue;
        }
        if ns == canonical {
            errors.push(ValidationError::CanonicalIsLegacy(ns.clone()));
        }
        legacy.insert(ns);
    }

    if url::Url::parse(&config.compat.public_base_url).is_err() {
        errors.push(ValidationError::PublicBaseUrl(
            config.compat.public_base_url.clone(),
        ));
    }

    for mapping in &config.compat.extra_mappings {
        let legacy_route = normalize_path(&mapping.legacy);
        let canonical_route = normalize_path(&mapping.canonical);
        let reason = if let Err(reason) = PathPattern::parse(&legacy_route) {
            Some(reason)
        } else if let Err(reason) = PathPattern::parse(&canonical_route) {
            Some(reason)
        } else if legacy_route == canonical_route {
            Some("legacy and canonical routes are identical".to_string())
        } else if legacy
            .iter()
            .any(|ns| canonical_route.starts_with(&format!("{}/", ns)))
        {
            Some("canonical route lies in a legacy namespace".to_string())
        } else {
            None
        };

        if let Some(reason) = reason {
            errors.push(ValidationError::Mapping {
                legacy: mapping.legacy.clone(),
                canonical: mapping.canonical.clone(),
                reason,
            });
        }
    }

    if config.telemetry.flush_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue("flush_interval_secs"));
    }
    if config.telemetry.max_callers == 0 {
        errors.push(ValidationError::ZeroValue("max_callers"));
    }
    if HeaderName::from_bytes(config.telemetry.caller_header.as_bytes()).is_err() {
        errors.push(ValidationError::CallerHeader(
            config.telemetry.caller_header.clone(),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::EmptyApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_namespace(ns: &str) -> Result<(), String> {
    if ns.is_empty() {
        return Err("namespace is empty".to_string());
    }
    if ns.contains('{') || ns.contains('}') {
        return Err("namespace cannot contain placeholders".to_string());
    }
    Ok(())
}
