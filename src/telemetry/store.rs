//! Deprecation usage counters.
//!
//! # Responsibilities
//! - Count calls per legacy route in memory on the request path
//! - Merge pending counts into the durable aggregate on flush
//! - Read and reset the aggregate for the admin surface
//!
//! # Design Decisions
//! - Per-key locking (`DashMap` entries), no I/O on the request path
//! - Flush drains what it merges, so a second flush adds nothing
//! - Flush and clear share one writer lock; a failed write puts counts back
//! - Caller tracking only in verbose mode, bounded per route

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::http::ApiRequest;
use crate::telemetry::kv::KvStore;

/// Key the aggregate map is stored under.
pub const STATS_KEY: &str = "deprecated_route_stats";

/// In-memory usage of one legacy route since the last flush.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeprecationRecord {
    pub legacy_route: String,
    pub canonical_route: String,
    pub call_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub distinct_callers: BTreeSet<String>,
}

/// Durable usage of one legacy route across flushes and restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeprecationAggregate {
    pub canonical_route: String,
    pub total_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub distinct_callers: BTreeSet<String>,
}

/// What one flush merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub routes: usize,
    pub calls: u64,
}

/// Telemetry options.
#[derive(Debug, Clone)]
pub struct TelemetryOptions {
    pub verbose: bool,
    pub caller_header: String,
    pub max_callers: usize,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self::from(&TelemetryConfig::default())
    }
}

impl From<&TelemetryConfig> for TelemetryOptions {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            verbose: config.verbose,
            caller_header: config.caller_header.to_lowercase(),
            max_callers: config.max_callers,
        }
    }
}

/// The deprecation telemetry store.
pub struct DeprecationTelemetry {
    pending: DashMap<String, DeprecationRecord>,
    store: Arc<dyn KvStore>,
    options: TelemetryOptions,
    writer: Mutex<()>,
}

impl DeprecationTelemetry {
    pub fn new(store: Arc<dyn KvStore>, options: TelemetryOptions) -> Self {
        Self {
            pending: DashMap::new(),
            store,
            options,
            writer: Mutex::new(()),
        }
    }

    /// Count one call to a legacy route.
    pub fn record_deprecation(&self, legacy_route: &str, canonical_route: &str, request: &ApiRequest) {
        let now = Utc::now();
        let caller = if self.options.verbose {
            request.header(&self.options.caller_header).map(str::to_string)
        } else {
            None
        };

        let mut record = self
            .pending
            .entry(legacy_route.to_string())
            .or_insert_with(|| DeprecationRecord {
                legacy_route: legacy_route.to_string(),
                canonical_route: canonical_route.to_string(),
                call_count: 0,
                first_seen: now,
                last_seen: now,
                distinct_callers: BTreeSet::new(),
            });

        record.call_count += 1;
        if now > record.last_seen {
            record.last_seen = now;
        }
        if let Some(caller) = caller {
            if record.distinct_callers.len() < self.options.max_callers {
                record.distinct_callers.insert(caller);
            }
        }
    }

    /// Snapshot of counts not yet flushed.
    pub fn pending(&self) -> BTreeMap<String, DeprecationRecord> {
        self.pending
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Merge pending counts into the durable aggregate.
    pub fn flush(&self) -> Result<FlushSummary, TelemetryError> {
        let _writer = self.writer.lock();

        let keys: Vec<String> = self.pending.iter().map(|r| r.key().clone()).collect();
        let drained: Vec<DeprecationRecord> = keys
            .iter()
            .filter_map(|k| self.pending.remove(k).map(|(_, record)| record))
            .collect();

        if drained.is_empty() {
            return Ok(FlushSummary::default());
        }

        let merged = self
            .read_aggregates()
            .and_then(|mut aggregates| {
                let summary = merge_into(&mut aggregates, &drained, self.options.max_callers);
                self.store
                    .set(STATS_KEY, serde_json::to_value(&aggregates)?)
                    .map(|_| summary)
            });

        if merged.is_err() {
            self.restore(drained);
        }
        merged
    }

    /// Durable aggregate, keyed by legacy route.
    pub fn get_stats(&self) -> Result<BTreeMap<String, DeprecationAggregate>, TelemetryError> {
        self.read_aggregates()
    }

    /// Drop pending counts and the durable aggregate. Irreversible.
    pub fn clear_stats(&self) -> Result<(), TelemetryError> {
        let _writer = self.writer.lock();
        self.pending.clear();
        self.store.delete(STATS_KEY)
    }

    fn read_aggregates(&self) -> Result<BTreeMap<String, DeprecationAggregate>, TelemetryError> {
        let value = self.store.get_or(STATS_KEY, serde_json::Value::Object(Default::default()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Put drained records back after a failed write, merging with anything recorded since.
    fn restore(&self, drained: Vec<DeprecationRecord>) {
        for record in drained {
            let max_callers = self.options.max_callers;
            self.pending
                .entry(record.legacy_route.clone())
                .and_modify(|current| {
                    current.call_count += record.call_count;
                    current.first_seen = current.first_seen.min(record.first_seen);
                    current.last_seen = current.last_seen.max(record.last_seen);
                    for caller in &record.distinct_callers {
                        if current.distinct_callers.len() >= max_callers {
                            break;
                        }
                        current.distinct_callers.insert(caller.clone());
                    }
                })
                .or_insert(record);
        }
    }
}

fn merge_into(
    aggregates: &mut BTreeMap<String, DeprecationAggregate>,
    drained: &[DeprecationRecord],
    max_callers: usize,
) -> FlushSummary {
    let mut summary = FlushSummary::default();
    for record in drained {
        summary.routes += 1;
        summary.calls += record.call_count;

        let aggregate = aggregates
            .entry(record.legacy_route.clone())
            .or_insert_with(|| DeprecationAggregate {
                canonical_route: record.canonical_route.clone(),
                total_count: 0,
                first_seen: record.first_seen,
                last_seen: record.last_seen,
                distinct_callers: BTreeSet::new(),
            });

        aggregate.total_count += record.call_count;
        aggregate.canonical_route = record.canonical_route.clone();
        aggregate.first_seen = aggregate.first_seen.min(record.first_seen);
        aggregate.last_seen = aggregate.last_seen.max(record.last_seen);
        for caller in &record.distinct_callers {
            if aggregate.distinct_callers.len() >= max_callers {
                break;
            }
            aggregate.distinct_callers.insert(caller.clone());
        }
    }
    summary
}
