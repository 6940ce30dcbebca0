//! Namespace resolution subsystem.
//!
//! # Data Flow
//! ```text
//! NamespaceConfig + CompatConfig (startup)
//!     → migrations.rs (built-in legacy buckets)
//!     → resolver.rs (canonical ns, legacy aliases, group prefixes, migration map)
//!     → Arc<NamespaceResolver> shared with registry, compat layer and hooks
//! ```
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Exact-match migration only; structural rewriting lives in the compat layer

pub mod migrations;
pub mod resolver;

pub use resolver::NamespaceResolver;
