// Fixed dataset: development default and test double

use async_trait::async_trait;

use super::TelemetryProvider;
use crate::error::TelemetryError;
use crate::models::{NO_ALARM, StatusSnapshot};

/// Always answers with the same snapshot.
#[derive(Debug, Clone)]
pub struct FixedTelemetry {
    snapshot: StatusSnapshot,
}

impl FixedTelemetry {
    pub fn new(snapshot: StatusSnapshot) -> Self {
        Self { snapshot }
    }
}

impl Default for FixedTelemetry {
    /// 72 % SOC, 43.5 kW PV, no alarm.
    fn default() -> Self {
        Self::new(StatusSnapshot::new(72.0, 43.5, NO_ALARM))
    }
}

#[async_trait]
impl TelemetryProvider for FixedTelemetry {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn fetch_current_status(&self) -> Result<StatusSnapshot, TelemetryError> {
        Ok(self.snapshot.clone())
    }
}
