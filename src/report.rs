//! The report document emitted once per tick.

use crate::error::ReportError;
use crate::stats::{SourceIpStats, StatsSnapshot, TargetStats, TotalStats};
use crate::system::SystemStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable snapshot of traffic and resource figures.
///
/// Maps are ordered so that the JSON encoding is stable between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDocument {
    timestamp: DateTime<Utc>,
    management_ip: String,
    total_stats: TotalStats,
    source_ip_stats: BTreeMap<String, SourceIpStats>,
    target_stats: BTreeMap<String, TargetStats>,
    system_stats: SystemStats,
}

impl ReportDocument {
    /// Combines a counter snapshot and a system sample into a document
    /// stamped with the current time.
    pub fn assemble(management_ip: &str, snapshot: StatsSnapshot, system: SystemStats) -> Self {
        Self {
            timestamp: Utc::now(),
            management_ip: management_ip.to_string(),
            total_stats: snapshot.totals,
            source_ip_stats: snapshot.sources,
            target_stats: snapshot.targets,
            system_stats: system,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn management_ip(&self) -> &str {
        &self.management_ip
    }

    pub fn totals(&self) -> &TotalStats {
        &self.total_stats
    }

    pub fn sources(&self) -> &BTreeMap<String, SourceIpStats> {
        &self.source_ip_stats
    }

    pub fn targets(&self) -> &BTreeMap<String, TargetStats> {
        &self.target_stats
    }

    pub fn system(&self) -> &SystemStats {
        &self.system_stats
    }

    /// Encodes the document as indented JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, ReportError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
