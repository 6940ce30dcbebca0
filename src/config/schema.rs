//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the registry host.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Canonical and legacy namespaces.
    pub namespace: NamespaceConfig,

    /// Legacy route forwarding.
    pub compat: CompatConfig,

    /// Deprecation telemetry.
    pub telemetry: TelemetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admin reporting surface.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Namespace configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// The current canonical namespace, e.g. "app/v1".
    pub canonical: String,

    /// Namespaces that are still served but deprecated.
    pub legacy: Vec<String>,

    /// Logical group name -> path prefix under the canonical namespace.
    pub group_prefixes: BTreeMap<String, String>,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        let group_prefixes = [
            ("events", "events"),
            ("communities", "communities"),
            ("conversations", "conversations"),
            ("social", "social"),
            ("moderation", "moderation"),
            ("discovery", "discover"),
            ("admin", "admin"),
        ]
        .into_iter()
        .map(|(g, p)| (g.to_string(), p.to_string()))
        .collect();

        Self {
            canonical: "app/v1".to_string(),
            legacy: vec!["old/v1".to_string(), "old-social/v1".to_string()],
            group_prefixes,
        }
    }
}

/// Legacy compatibility configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Bind shadow routes for legacy paths.
    pub enabled: bool,

    /// Seed the mapping table from the built-in buckets.
    pub builtin_mappings: bool,

    /// Date after which legacy routes may stop working (`Deprecation` and `Sunset` headers).
    pub sunset: DateTime<Utc>,

    /// Public base URL used to build replacement and documentation links.
    pub public_base_url: String,

    /// Additional legacy -> canonical mappings.
    pub extra_mappings: Vec<MappingConfig>,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            builtin_mappings: true,
            sunset: fixed_date(2026, 12, 31),
            public_base_url: "http://localhost:8080".to_string(),
            extra_mappings: Vec::new(),
        }
    }
}

fn fixed_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A single legacy mapping supplied through configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MappingConfig {
    /// Full legacy route, e.g. "old/v1/events".
    pub legacy: String,

    /// Full canonical route, e.g. "app/v1/events".
    pub canonical: String,
}

/// Deprecation telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Track distinct callers per legacy route.
    pub verbose: bool,

    /// Header identifying the caller.
    pub caller_header: String,

    /// Upper bound on distinct callers kept per route.
    pub max_callers: usize,

    /// Interval between flushes to the durable store, in seconds.
    pub flush_interval_secs: u64,

    /// JSON file backing the durable store; in-memory when unset.
    pub store_path: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            caller_header: "user-agent".to_string(),
            max_callers: 50,
            flush_interval_secs: 300,
            store_path: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Admin reporting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
