//! Admin reporting surface.
//!
//! # Data Flow
//! ```text
//! GET/DELETE {ns}/admin/deprecations
//!     → auth.rs (bearer key → permission check on the route)
//!     → handlers.rs (telemetry report / clear_stats)
//! ```
//!
//! # Design Decisions
//! - Routes go through the registry like every other module
//! - Authorization is a route permission check, not middleware

pub mod auth;
pub mod handlers;

pub use auth::BearerAuthorizer;
pub use handlers::{AdminController, ADMIN_MODULE};
