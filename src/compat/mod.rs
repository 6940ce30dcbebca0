//! Backward-compatibility layer for legacy routes.
//!
//! # Data Flow
//! ```text
//! Bootstrap (AfterRegister):
//!     NamespaceResolver migrations + MappingExtension hooks
//!         → dispatcher.rs (one shadow route per mapping, via RouteRegistry)
//!
//! Legacy request:
//!     RouteTable → shadow handler (dispatcher.rs)
//!         → telemetry (record_deprecation)
//!         → rewrite onto canonical route → RouteTable::dispatch
//!         → headers.rs (deprecation headers + `_deprecated` block)
//!
//! Every response:
//!     RouteTable hooks → namespace.rs (flag legacy namespaces)
//! ```
//!
//! # Design Decisions
//! - Per-path forwarding and namespace flagging stay independent
//! - Deprecation is advisory: status codes pass through unchanged

pub mod dispatcher;
pub mod headers;
pub mod namespace;

pub use dispatcher::{CompatOptions, LegacyDispatcher, MappingExtension, COMPAT_MODULE, LEGACY_GROUP};
pub use headers::DeprecationNotice;
pub use namespace::NamespaceDeprecationHook;
