// Live telemetry over HTTP (BMS / inverter gateway exposing a JSON status document)

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::TelemetryProvider;
use crate::error::TelemetryError;
use crate::models::StatusSnapshot;
use crate::version::{NAME, VERSION};

/// GETs `url` and decodes a [`StatusSnapshot`] from the body. Range checks are
/// left to the caller.
///
/// At most `max_concurrent` fetches are in flight; the rest wait for a permit.
/// The timeout covers waiting for a permit plus the whole exchange.
pub struct HttpTelemetry {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    permits: Semaphore,
}

impl HttpTelemetry {
    pub fn new(url: String, timeout: Duration, max_concurrent: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("{}/{}", NAME, VERSION))
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url,
            timeout,
            permits: Semaphore::new(max_concurrent.max(1)),
        })
    }

    async fn fetch(&self) -> Result<StatusSnapshot, TelemetryError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| TelemetryError::Unavailable(format!("fetch limiter closed: {}", e)))?;

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TelemetryError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Unavailable(format!(
                "upstream answered {}",
                status
            )));
        }

        let snapshot: StatusSnapshot = response.json().await.map_err(|e| {
            if e.is_decode() {
                TelemetryError::Malformed(e.to_string())
            } else {
                TelemetryError::Unavailable(e.to_string())
            }
        })?;
        Ok(snapshot)
    }
}

#[async_trait]
impl TelemetryProvider for HttpTelemetry {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_current_status(&self) -> Result<StatusSnapshot, TelemetryError> {
        tokio::time::timeout(self.timeout, self.fetch())
            .await
            .map_err(|_| {
                TelemetryError::Unavailable(format!(
                    "no answer from {} within {} ms",
                    self.url,
                    self.timeout.as_millis()
                ))
            })?
    }
}
