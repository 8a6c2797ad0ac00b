// Domain models: the status snapshot served to the dashboard

use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;

/// Alarm state reported when nothing is raised.
pub const NO_ALARM: &str = "No Alarm";

/// Point-in-time ESS/PV telemetry returned by GET /api/status.
///
/// Always serialized in camelCase. Deserialization also accepts the field names
/// of the prototype backend (`ess_soc`, `pv_output`, `alarm`) so an upstream
/// still speaking that format can be used as a live source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Battery state of charge in percent, 0..=100.
    #[serde(alias = "ess_soc")]
    pub state_of_charge: f64,
    /// PV generation in kW, never negative.
    #[serde(alias = "pv_output")]
    pub pv_output_kw: f64,
    /// "No Alarm" or a site-specific alarm code.
    #[serde(alias = "alarm")]
    pub alarm_state: String,
}

impl StatusSnapshot {
    pub fn new(state_of_charge: f64, pv_output_kw: f64, alarm_state: impl Into<String>) -> Self {
        Self {
            state_of_charge,
            pv_output_kw,
            alarm_state: alarm_state.into(),
        }
    }

    /// Check the value constraints; a violation means the source sent bad data.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if !self.state_of_charge.is_finite() || !(0.0..=100.0).contains(&self.state_of_charge) {
            return Err(TelemetryError::Malformed(format!(
                "stateOfCharge must be within 0..=100, got {}",
                self.state_of_charge
            )));
        }
        if !self.pv_output_kw.is_finite() || self.pv_output_kw < 0.0 {
            return Err(TelemetryError::Malformed(format!(
                "pvOutputKw must be >= 0, got {}",
                self.pv_output_kw
            )));
        }
        if self.alarm_state.trim().is_empty() {
            return Err(TelemetryError::Malformed(
                "alarmState must be non-empty".into(),
            ));
        }
        Ok(())
    }
}
