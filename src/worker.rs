// Background refresher: polls the telemetry provider and keeps the last known good snapshot.
// Only runs with telemetry.stale_policy = "serve_last_known_good"; request handlers never write the store.

use crate::telemetry::{LastKnownGood, TelemetryProvider};
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::Instrument;

/// Provider, store and shutdown for the refresher.
pub struct RefresherDeps {
    pub provider: Arc<dyn TelemetryProvider>,
    pub store: Arc<LastKnownGood>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Refresher timing and logging config.
pub struct RefresherConfig {
    pub refresh_interval_ms: u64,
    /// How often to log refresher stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: RefresherDeps, config: RefresherConfig) -> tokio::task::JoinHandle<()> {
    let RefresherDeps {
        provider,
        store,
        mut shutdown_rx,
    } = deps;
    let RefresherConfig {
        refresh_interval_ms,
        stats_log_interval_secs,
    } = config;

    let span = tracing::span!(
        tracing::Level::DEBUG,
        "refresher",
        provider = provider.name(),
        refresh_interval_ms
    );

    let task = async move {
        let mut tick = interval(Duration::from_millis(refresh_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick of an interval completes immediately.
        stats_log_tick.tick().await;

        let mut snapshots_refreshed_total: u64 = 0;
        let mut refresh_failures_total: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let result = provider
                        .fetch_current_status()
                        .await
                        .and_then(|s| s.validate().map(|()| s));
                    match result {
                        Ok(snapshot) => {
                            store.store(snapshot).await;
                            snapshots_refreshed_total += 1;
                        }
                        Err(e) => {
                            refresh_failures_total += 1;
                            tracing::warn!(
                                error = %e,
                                operation = "refresh_last_known_good",
                                "telemetry refresh failed"
                            );
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Refresher shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let age_ms = store.latest().await.map(|(_, age)| age.as_millis() as u64);
                    tracing::info!(
                        snapshots_refreshed_total,
                        refresh_failures_total,
                        last_known_good_age_ms = ?age_ms,
                        "refresher stats"
                    );
                }
            }
        }
    };
    tokio::spawn(task.instrument(span))
}
