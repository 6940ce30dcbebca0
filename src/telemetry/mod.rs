//! Deprecation telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! Legacy shadow handler
//!     → store.rs (record_deprecation: in-memory counters)
//!
//! Flush task (lifecycle/flusher.rs) / shutdown
//!     → store.rs (flush: drain pending, merge)
//!     → kv.rs (KvStore: memory or JSON file)
//!
//! Admin handlers
//!     → store.rs (get_stats / pending / clear_stats)
//! ```
//!
//! # Design Decisions
//! - Request path never touches the durable store
//! - Durable store is a trait so embedders can supply their own

pub mod kv;
pub mod store;

pub use kv::{JsonFileStore, KvStore, MemoryStore};
pub use store::{
    DeprecationAggregate, DeprecationRecord, DeprecationTelemetry, FlushSummary,
    TelemetryOptions, STATS_KEY,
};
