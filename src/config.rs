//! Configuration management for the telemetry reporter
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer defaults, a TOML file, environment variables
//! and command-line flags.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval used when the configured one is not positive.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Longest interval the scheduler accepts. Larger values are capped.
pub const MAX_REPORT_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for periodic reporting.
    pub report: ReportConfig,
}

/// Configuration for periodic reporting.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReportConfig {
    /// Seconds between reports. Zero or negative selects the default.
    pub interval: i64,
    /// Collector endpoint. Empty keeps reports in the local log only.
    #[serde(default)]
    pub url: String,
    /// Identifier of this host in emitted documents.
    #[serde(default)]
    pub management_ip: String,
}

impl ReportConfig {
    /// The interval to schedule with, after clamping.
    pub fn effective_interval(&self) -> Duration {
        if self.interval <= 0 {
            DEFAULT_REPORT_INTERVAL
        } else {
            Duration::from_secs(self.interval as u64).min(MAX_REPORT_INTERVAL)
        }
    }

    /// The collector URL, if one is configured.
    pub fn destination(&self) -> Option<&str> {
        let url = self.url.trim();
        (!url.is_empty()).then_some(url)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REPORT_INTERVAL.as_secs() as i64,
            url: String::new(),
            management_ip: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Builds the layered `Figment` without CLI overrides.
    ///
    /// Environment variables use the `SHOOTER_` prefix and `__` for nesting,
    /// e.g. `SHOOTER_REPORT__URL`.
    pub fn figment(config_path: Option<&std::path::Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("SHOOTER_").split("__"))
    }

    /// Loads the configuration from the file named on the command line, the
    /// environment, and finally the command-line flags themselves.
    pub fn load_from_cli(cli: &Cli) -> Result<Self> {
        let config = Self::figment(cli.config.as_deref())
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}
