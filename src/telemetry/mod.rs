// Telemetry providers: where GET /api/status gets its numbers

mod fixed;
mod http;
mod last_known_good;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{TelemetryConfig, TelemetrySource};
use crate::error::TelemetryError;
use crate::models::StatusSnapshot;

pub use fixed::FixedTelemetry;
pub use http::HttpTelemetry;
pub use last_known_good::LastKnownGood;

/// Source of the current ESS/PV status.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the current status. Must not block the runtime.
    async fn fetch_current_status(&self) -> Result<StatusSnapshot, TelemetryError>;
}

/// Build the provider selected by `telemetry.source`.
pub fn from_config(config: &TelemetryConfig) -> anyhow::Result<Arc<dyn TelemetryProvider>> {
    match config.source {
        TelemetrySource::Fixed => Ok(Arc::new(FixedTelemetry::default())),
        TelemetrySource::Http => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("telemetry.url is required for the http source"))?;
            Ok(Arc::new(HttpTelemetry::new(
                url,
                Duration::from_millis(config.timeout_ms),
                config.max_concurrent_fetches,
            )?))
        }
    }
}
