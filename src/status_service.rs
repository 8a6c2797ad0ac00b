// Status service: provider call, validation and the stale-data policy

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::{AppConfig, StalePolicy};
use crate::error::TelemetryError;
use crate::models::StatusSnapshot;
use crate::telemetry::{self, LastKnownGood, TelemetryProvider};
use crate::worker;

struct StaleFallback {
    store: Arc<LastKnownGood>,
    max_age: Duration,
}

/// Answers GET /api/status. Holds no mutable state of its own.
pub struct StatusService {
    provider: Arc<dyn TelemetryProvider>,
    stale: Option<StaleFallback>,
}

impl StatusService {
    /// Service that fails when the provider fails.
    pub fn new(provider: Arc<dyn TelemetryProvider>) -> Self {
        Self {
            provider,
            stale: None,
        }
    }

    /// Serve `store`'s snapshot (if younger than `max_age`) when the provider is unavailable.
    pub fn with_last_known_good(mut self, store: Arc<LastKnownGood>, max_age: Duration) -> Self {
        self.stale = Some(StaleFallback { store, max_age });
        self
    }

    /// Build the provider from `[telemetry]` and, with `serve_last_known_good`,
    /// spawn the refresher feeding the fallback store. The refresher stops on `shutdown_rx`.
    pub fn from_config(
        config: &AppConfig,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> anyhow::Result<(Self, Option<JoinHandle<()>>)> {
        let provider = telemetry::from_config(&config.telemetry)?;
        let service = Self::new(provider.clone());
        match config.telemetry.stale_policy {
            StalePolicy::Fail => Ok((service, None)),
            StalePolicy::ServeLastKnownGood => {
                let store = Arc::new(LastKnownGood::new());
                let service = service.with_last_known_good(
                    store.clone(),
                    Duration::from_secs(config.telemetry.max_stale_secs),
                );
                let handle = worker::spawn(
                    worker::RefresherDeps {
                        provider,
                        store,
                        shutdown_rx,
                    },
                    worker::RefresherConfig {
                        refresh_interval_ms: config.telemetry.refresh_interval_ms,
                        stats_log_interval_secs: config.monitoring.stats_log_interval_secs,
                    },
                );
                Ok((service, Some(handle)))
            }
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn serves_last_known_good(&self) -> bool {
        self.stale.is_some()
    }

    pub async fn current_status(&self) -> Result<StatusSnapshot, TelemetryError> {
        let result = self
            .provider
            .fetch_current_status()
            .await
            .and_then(|s| s.validate().map(|()| s));

        match result {
            Ok(snapshot) => Ok(snapshot),
            Err(TelemetryError::Unavailable(reason)) => {
                if let Some(fallback) = &self.stale
                    && let Some((snapshot, age)) = fallback.store.fresh(fallback.max_age).await
                {
                    tracing::warn!(
                        provider = self.provider.name(),
                        error = %reason,
                        age_ms = age.as_millis() as u64,
                        operation = "fetch_current_status",
                        "telemetry unavailable; serving last known good snapshot"
                    );
                    return Ok(snapshot);
                }
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %reason,
                    operation = "fetch_current_status",
                    "telemetry unavailable"
                );
                Err(TelemetryError::Unavailable(reason))
            }
            Err(e @ TelemetryError::Malformed(_)) => {
                tracing::error!(
                    provider = self.provider.name(),
                    error = %e,
                    operation = "fetch_current_status",
                    "telemetry source sent invalid data"
                );
                Err(e)
            }
        }
    }
}
