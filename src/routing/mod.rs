//! Routing subsystem: the host route table the registry binds into.
//!
//! # Data Flow
//! ```text
//! Route binding (bootstrap):
//!     RouteRegistry / compat layer
//!     → router.rs bind(namespace, pattern, methods, handler, permission)
//!     → matcher.rs compiles the `{name}` pattern
//!
//! Incoming Request (method, path)
//!     → router.rs (route lookup, first match wins)
//!     → matcher.rs (segment match, capture path params)
//!     → permission check → handler → response hooks
//! ```
//!
//! # Design Decisions
//! - Routes bound at startup, read lock-free at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::{substitute_placeholders, PathPattern};
pub use router::{
    allow_all, handler, permission, BoundRouteInfo, Handler, HandlerFuture, PermissionCheck,
    ResponseHook, RouteTable,
};
