//! Traffic counters and their point-in-time snapshots.
//!
//! `TrafficStats` is the shared store that sender tasks write into. The
//! reporter never mutates it; it only takes a `StatsSnapshot`, which copies
//! totals, per-source and per-target figures under a single shared guard so
//! that every field describes the same instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

/// Cumulative counters for one source address.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCounters {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub last_active: DateTime<Utc>,
}

/// Per-target figures. Owned by the store and copied into reports as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub last_active: DateTime<Utc>,
}

/// The raw contents of the counter store.
#[derive(Debug, Clone, Default)]
pub struct TrafficCounters {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub source_ip_stats: HashMap<String, SourceCounters>,
    pub target_stats: HashMap<String, TargetStats>,
}

/// The shared, lock-protected counter store.
///
/// Writers take the exclusive lock once per mutation; readers take the shared
/// lock for as long as they need a consistent view.
#[derive(Debug, Default)]
pub struct TrafficStats {
    inner: RwLock<TrafficCounters>,
}

impl TrafficStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one packet of `bytes` sent from `source_ip` to `target`.
    pub fn record_send(&self, source_ip: &str, target: &str, bytes: u64) {
        let now = Utc::now();
        let mut counters = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        counters.bytes_sent += bytes;
        counters.packets_sent += 1;

        let source = counters
            .source_ip_stats
            .entry(source_ip.to_string())
            .or_insert_with(|| SourceCounters {
                bytes_sent: 0,
                packets_sent: 0,
                last_active: now,
            });
        source.bytes_sent += bytes;
        source.packets_sent += 1;
        source.last_active = now;

        let target = counters
            .target_stats
            .entry(target.to_string())
            .or_insert_with(|| TargetStats {
                bytes_sent: 0,
                packets_sent: 0,
                last_active: now,
            });
        target.bytes_sent += bytes;
        target.packets_sent += 1;
        target.last_active = now;
    }

    /// Acquires shared read access to the counters.
    ///
    /// A poisoned lock is recovered: a panicking writer must not take
    /// telemetry down with it.
    pub fn read(&self) -> RwLockReadGuard<'_, TrafficCounters> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Computes throughput in megabits per second.
///
/// Returns exactly 0 when the elapsed time is not positive.
pub fn bandwidth_mbps(bytes: u64, uptime_seconds: f64) -> f64 {
    if uptime_seconds > 0.0 {
        (bytes as f64 * 8.0) / (uptime_seconds * 1_000_000.0)
    } else {
        0.0
    }
}

/// Overall totals as of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TotalStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bandwidth_mbps: f64,
    pub uptime_seconds: f64,
}

/// One source address as of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceIpStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bandwidth_mbps: f64,
    pub last_active: DateTime<Utc>,
}

/// A copied, self-consistent view of the counter store with derived rates.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub totals: TotalStats,
    pub sources: BTreeMap<String, SourceIpStats>,
    pub targets: BTreeMap<String, TargetStats>,
}

impl StatsSnapshot {
    /// Copies the store while holding its shared lock for the whole copy.
    pub fn capture(stats: &TrafficStats, uptime: Duration) -> Self {
        let counters = stats.read();
        Self::from_counters(&counters, uptime.as_secs_f64())
    }

    /// Builds a snapshot from already-locked counters.
    ///
    /// Sources with zero bytes are kept and report a zero rate.
    pub fn from_counters(counters: &TrafficCounters, uptime_seconds: f64) -> Self {
        let totals = TotalStats {
            bytes_sent: counters.bytes_sent,
            packets_sent: counters.packets_sent,
            bandwidth_mbps: bandwidth_mbps(counters.bytes_sent, uptime_seconds),
            uptime_seconds,
        };

        let sources = counters
            .source_ip_stats
            .iter()
            .map(|(ip, source)| {
                let stats = SourceIpStats {
                    bytes_sent: source.bytes_sent,
                    packets_sent: source.packets_sent,
                    bandwidth_mbps: bandwidth_mbps(source.bytes_sent, uptime_seconds),
                    last_active: source.last_active,
                };
                (ip.clone(), stats)
            })
            .collect();

        let targets = counters
            .target_stats
            .iter()
            .map(|(key, target)| (key.clone(), target.clone()))
            .collect();

        Self {
            totals,
            sources,
            targets,
        }
    }
}
