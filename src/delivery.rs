//! Best-effort delivery of encoded reports to a remote collector.

use crate::error::DeliveryError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, instrument};

/// Product identifier sent as the `User-Agent` of every delivery.
pub const USER_AGENT: &str = "UDP-Shooter/1.0";

/// Upper bound on a single delivery, connection included.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// A destination that accepts encoded reports.
#[async_trait]
pub trait RemoteDelivery: Send + Sync {
    /// Sends one encoded report. Implementations make a single attempt.
    async fn deliver(&self, body: &[u8]) -> Result<(), DeliveryError>;

    /// A printable description of the destination, for logs.
    fn destination(&self) -> &str;
}

/// Posts reports as JSON to an HTTP endpoint.
pub struct HttpDelivery {
    client: reqwest::Client,
    url: String,
}

impl HttpDelivery {
    /// Creates a new `HttpDelivery` with the default timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, DeliveryError> {
        Self::with_timeout(url, DELIVERY_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(DeliveryError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RemoteDelivery for HttpDelivery {
    #[instrument(skip(self, body), fields(url = %self.url, bytes = body.len()))]
    async fn deliver(&self, body: &[u8]) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|source| DeliveryError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Report delivered");
            Ok(())
        } else {
            Err(DeliveryError::Status {
                url: self.url.clone(),
                status,
            })
        }
    }

    fn destination(&self) -> &str {
        &self.url
    }
}
