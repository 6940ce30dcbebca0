//! REST route registry with a backward-compatibility layer for legacy routes.
//!
//! Modules publish routes through [`RouteRegistry`]; duplicate keys are
//! rejected and recorded as conflicts. Legacy paths get shadow routes that
//! forward to their canonical replacement, decorate the response with
//! deprecation metadata, and count the call.

// Core subsystems
pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod namespace;
pub mod registry;
pub mod routing;

// Compatibility and reporting
pub mod admin;
pub mod compat;
pub mod discovery;
pub mod telemetry;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use app::{App, AppBuilder};
pub use config::RegistryConfig;
pub use error::{ApiError, RegistryError, TelemetryError};
pub use http::{ApiRequest, ApiResponse, HttpMethod, HttpServer};
pub use lifecycle::Shutdown;
pub use registry::{RouteKey, RouteRegistration, RouteRegistry};
pub use routing::{handler, RouteTable};
