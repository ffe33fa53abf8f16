//! Error types for the reporter.
//!
//! None of these are fatal to the host process. They exist so that each
//! failure class can be logged at the right level and then dropped.

use reqwest::StatusCode;
use thiserror::Error;

/// A failure to hand a report to the remote collector.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or body transfer failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The collector answered with a non-2xx status.
    #[error("collector {url} responded with status {status}")]
    Status { url: String, status: StatusCode },
}

impl DeliveryError {
    /// Returns true if the underlying transport error was a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            DeliveryError::Transport { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// A failure while turning a tick's snapshot into an emitted report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while constructing a `Reporter`.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
