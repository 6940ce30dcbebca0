//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → HTTP server (stop accepting, drain)
//!               → flusher.rs (final telemetry flush, exit)
//!
//! Flusher (flusher.rs):
//!     interval tick → DeprecationTelemetry::flush (blocking pool)
//! ```
//!
//! # Design Decisions
//! - One broadcast channel drives every long-running task
//! - Telemetry is flushed after the server stops taking requests

pub mod flusher;
pub mod shutdown;
pub mod signals;

pub use flusher::{flush_now, spawn_flusher};
pub use shutdown::{wait_for, Shutdown};
pub use signals::{shutdown_signal, spawn_signal_listener};
