use anyhow::Context;
use axum::http::HeaderValue;
use serde::Deserialize;

/// Wildcard entry in `cors.allowed_origins`.
pub const ANY_ORIGIN: &str = "*";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Exact origins (`https://dash.example.com`) or a single `"*"`.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allow_credentials: false,
        }
    }
}

impl CorsConfig {
    pub fn is_wildcard(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == ANY_ORIGIN)
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![ANY_ORIGIN.to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetrySource {
    /// Built-in dataset (72 % SOC, 43.5 kW, "No Alarm").
    Fixed,
    /// JSON document fetched from `telemetry.url`.
    Http,
}

/// What GET /api/status does when the source is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Answer 503.
    Fail,
    /// Answer with the last snapshot the refresher captured, if younger than `max_stale_secs`.
    ServeLastKnownGood,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_source")]
    pub source: TelemetrySource,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_stale_policy")]
    pub stale_policy: StalePolicy,
    #[serde(default = "default_max_stale_secs")]
    pub max_stale_secs: u64,
    /// Poll period of the last-known-good refresher; unused with `stale_policy = "fail"`.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            url: None,
            timeout_ms: default_timeout_ms(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            stale_policy: default_stale_policy(),
            max_stale_secs: default_max_stale_secs(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

fn default_source() -> TelemetrySource {
    TelemetrySource::Fixed
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_stale_policy() -> StalePolicy {
    StalePolicy::Fail
}

fn default_max_stale_secs() -> u64 {
    30
}

fn default_refresh_interval_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often the refresher logs its counters at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        self.validate_cors()?;
        self.validate_telemetry()?;
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }

    fn validate_cors(&self) -> anyhow::Result<()> {
        let cors = &self.cors;
        anyhow::ensure!(
            !cors.allowed_origins.is_empty(),
            "cors.allowed_origins must be non-empty"
        );
        if cors.is_wildcard() {
            anyhow::ensure!(
                cors.allowed_origins.len() == 1,
                "cors.allowed_origins: \"*\" cannot be combined with explicit origins"
            );
            anyhow::ensure!(
                !cors.allow_credentials,
                "cors.allow_credentials = true cannot be combined with cors.allowed_origins = [\"*\"]; list the origins explicitly"
            );
            return Ok(());
        }
        for origin in &cors.allowed_origins {
            let scheme_ok = origin.starts_with("http://") || origin.starts_with("https://");
            anyhow::ensure!(
                scheme_ok && !origin.ends_with('/') && HeaderValue::from_str(origin).is_ok(),
                "cors.allowed_origins entry is not a valid origin (scheme://host[:port]): {:?}",
                origin
            );
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        let t = &self.telemetry;
        if t.source == TelemetrySource::Http {
            let url = t.url.as_deref().unwrap_or_default();
            anyhow::ensure!(
                !url.is_empty(),
                "telemetry.url must be set when telemetry.source = \"http\""
            );
            let parsed = reqwest::Url::parse(url)
                .with_context(|| format!("telemetry.url is not a valid URL: {}", url))?;
            anyhow::ensure!(
                matches!(parsed.scheme(), "http" | "https"),
                "telemetry.url must use http or https, got {}",
                parsed.scheme()
            );
        }
        anyhow::ensure!(
            t.timeout_ms > 0,
            "telemetry.timeout_ms must be > 0, got {}",
            t.timeout_ms
        );
        anyhow::ensure!(
            t.max_concurrent_fetches > 0,
            "telemetry.max_concurrent_fetches must be > 0, got {}",
            t.max_concurrent_fetches
        );
        anyhow::ensure!(
            t.max_stale_secs > 0,
            "telemetry.max_stale_secs must be > 0, got {}",
            t.max_stale_secs
        );
        anyhow::ensure!(
            t.refresh_interval_ms > 0,
            "telemetry.refresh_interval_ms must be > 0, got {}",
            t.refresh_interval_ms
        );
        Ok(())
    }
}
