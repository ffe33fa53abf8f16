//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged over
//! the configuration file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Periodic traffic and resource reporter for the packet sender.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seconds between reports (zero or negative selects 10 minutes).
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Collector URL to POST reports to.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Identifier of this host in reports.
    #[arg(long, value_name = "ID")]
    pub management_ip: Option<String>,

    /// Logging level (e.g. info, debug).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut report = Dict::new();
        if let Some(interval) = self.interval {
            report.insert("interval".into(), Value::from(interval));
        }
        if let Some(url) = &self.url {
            report.insert("url".into(), Value::from(url.clone()));
        }
        if let Some(id) = &self.management_ip {
            report.insert("management_ip".into(), Value::from(id.clone()));
        }

        let mut dict = Dict::new();
        if !report.is_empty() {
            dict.insert("report".into(), Value::from(report));
        }
        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
