//! Periodic telemetry flushing.
//!
//! # Responsibilities
//! - Flush deprecation telemetry every `flush_interval_secs`
//! - Flush once more when shutdown is triggered
//!
//! # Design Decisions
//! - Store I/O runs on the blocking pool, never on a request worker
//! - Failures are logged and counted; counts stay pending for the next tick

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::TelemetryError;
use crate::observability::metrics;
use crate::telemetry::{DeprecationTelemetry, FlushSummary};

/// Flush once on the blocking pool, logging and counting the outcome.
pub async fn flush_now(telemetry: &Arc<DeprecationTelemetry>) -> Result<FlushSummary, TelemetryError> {
    let telemetry = Arc::clone(telemetry);
    let result = tokio::task::spawn_blocking(move || telemetry.flush())
        .await
        .unwrap_or_else(|e| Err(TelemetryError::Io(std::io::Error::other(e.to_string()))));

    match &result {
        Ok(summary) if summary.calls > 0 => {
            tracing::info!(routes = summary.routes, calls = summary.calls, "Deprecation telemetry flushed");
        }
        Ok(_) => tracing::trace!("Nothing to flush"),
        Err(e) => tracing::error!(error = %e, "Deprecation telemetry flush failed"),
    }
    metrics::record_telemetry_flush(result.is_ok());
    result
}

/// Spawn the flush loop. It exits after a final flush once shutdown fires.
pub fn spawn_flusher(
    telemetry: Arc<DeprecationTelemetry>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = flush_now(&telemetry).await;
                }
                _ = shutdown.recv() => {
                    let _ = flush_now(&telemetry).await;
                    tracing::debug!("Telemetry flusher stopped");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ApiRequest, HttpMethod};
    use crate::lifecycle::Shutdown;
    use crate::telemetry::{MemoryStore, TelemetryOptions};

    fn telemetry() -> Arc<DeprecationTelemetry> {
        Arc::new(DeprecationTelemetry::new(
            Arc::new(MemoryStore::new()),
            TelemetryOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_final_flush_on_shutdown() {
        let telemetry = telemetry();
        let shutdown = Shutdown::new();
        let handle = spawn_flusher(
            Arc::clone(&telemetry),
            Duration::from_secs(3600),
            shutdown.subscribe(),
        );

        let req = ApiRequest::new(HttpMethod::Get, "old/v1/events");
        telemetry.record_deprecation("old/v1/events", "app/v1/events", &req);
        shutdown.trigger();
        handle.await.unwrap();

        assert!(telemetry.pending().is_empty());
        assert_eq!(telemetry.get_stats().unwrap()["old/v1/events"].total_count, 1);
    }

    #[tokio::test]
    async fn test_periodic_flush() {
        let telemetry = telemetry();
        let shutdown = Shutdown::new();
        let _handle = spawn_flusher(
            Arc::clone(&telemetry),
            Duration::from_millis(20),
            shutdown.subscribe(),
        );

        let req = ApiRequest::new(HttpMethod::Get, "old/v1/events");
        telemetry.record_deprecation("old/v1/events", "app/v1/events", &req);

        for _ in 0..100 {
            if telemetry.pending().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(telemetry.pending().is_empty());
        assert_eq!(telemetry.get_stats().unwrap()["old/v1/events"].total_count, 1);
    }
}
