//! Shooter Telemetry - periodic traffic and resource reporting
//!
//! This library snapshots the packet sender's shared traffic counters,
//! samples process resource usage, and emits the result as a JSON document
//! to the log and, optionally, to a remote HTTP collector.

pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod formatting;
pub mod report;
pub mod reporter;
pub mod stats;
pub mod system;

// Re-export the main entry points for convenience
pub use report::ReportDocument;
pub use reporter::{Reporter, ReporterBuilder, ReporterState};
pub use stats::{StatsSnapshot, TrafficStats};
pub use system::{SystemSampler, SystemStats};
