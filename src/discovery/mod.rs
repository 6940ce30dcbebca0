//! Discovery endpoint.
//!
//! # Data Flow
//! ```text
//! GET {ns}/discover          → catalog, groups, conflicts, statistics
//! GET {ns}/discover/{group}  → one group, or 404 listing the known groups
//! GET {ns}/openapi           → generated API document
//!     ↑
//! RouteRegistry snapshot (read-only)
//! ```
//!
//! # Design Decisions
//! - Registered through the registry like any other module
//! - Holds a `Weak` registry handle; the registry owns these routes

pub mod controller;

pub use controller::{DiscoveryController, DISCOVERY_MODULE};
