//! Route registry subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap (single-threaded):
//!     bootstrap.rs phases: before-register → register → after-register
//!     → catalog.rs register(): validate key, detect conflict, bind on RouteTable
//!     → catalog.rs collect_untracked(): reconcile with the table
//!
//! Readers (any thread, any time):
//!     discovery / admin / tooling
//!     → catalog.rs projections, stats.rs, openapi.rs
//! ```
//!
//! # Design Decisions
//! - First registrant wins; later attempts are logged, recorded, rejected
//! - Snapshot state behind `ArcSwap`: concurrent reads never block
//! - Statistics and API documents are computed on demand

pub mod bootstrap;
pub mod catalog;
pub mod key;
pub mod openapi;
pub mod stats;

pub use bootstrap::{Bootstrap, BootstrapReport, Phase};
pub use catalog::{
    ApiInfo, Conflict, Controller, RouteInfo, RouteRegistration, RouteRegistry, UNKNOWN_MODULE,
    UNTRACKED_GROUP,
};
pub use key::RouteKey;
pub use stats::RegistryStats;
