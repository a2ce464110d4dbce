//! Raw request payload for the analyze phase.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::Units;

/// Inputs rejected before any fetch or provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unsupported units {0:?} (expected lbs or kg)")]
    UnsupportedUnits(String),

    #[error("duration_minutes must be positive, got {0}")]
    NonPositiveDuration(i64),
}

/// Everything the analyze phase needs from the caller.
///
/// Field names follow the external snake_case contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerInputs {
    /// Reference to the long-form rules document (goals, bans, preferences).
    #[serde(default)]
    pub instructions_url: String,
    /// Reference to set-level training history.
    #[serde(default)]
    pub history_url: String,
    /// Pre-shaped recent cardio activity, passed to the model verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strava_recent: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upcoming_cardio_text: String,
    /// `gym:<name>`, `home`, `hotel:<name>`.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub equipment_inventory: Vec<String>,
    #[serde(default)]
    pub duration_minutes: i64,
    /// `lbs` or `kg`; empty means `lbs`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub units: String,
    /// Recovery signals (0-100). `None` is absent, never zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garmin_sleep_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garmin_body_battery: Option<i64>,
}

impl AnalyzerInputs {
    /// Resolve the unit system, defaulting to pounds.
    pub fn units(&self) -> Result<Units, InputError> {
        if self.units.trim().is_empty() {
            return Ok(Units::Lbs);
        }
        self.units
            .parse()
            .map_err(|_| InputError::UnsupportedUnits(self.units.clone()))
    }

    /// Check the fields that must hold before the pipeline does any I/O.
    pub fn validate(&self) -> Result<(), InputError> {
        self.units()?;
        if self.duration_minutes <= 0 {
            return Err(InputError::NonPositiveDuration(self.duration_minutes));
        }
        Ok(())
    }

    /// The activity blob, or `None` when absent or JSON `null`.
    pub fn recent_activity(&self) -> Option<&Value> {
        self.strava_recent.as_ref().filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_units_default_to_lbs() {
        let inputs = AnalyzerInputs {
            units: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(inputs.units().unwrap(), Units::Lbs);
    }

    #[test]
    fn units_are_case_insensitive() {
        let inputs = AnalyzerInputs {
            units: "KG".to_string(),
            ..Default::default()
        };
        assert_eq!(inputs.units().unwrap(), Units::Kg);
    }

    #[test]
    fn unknown_units_are_rejected() {
        let inputs = AnalyzerInputs {
            units: "stone".to_string(),
            duration_minutes: 45,
            ..Default::default()
        };
        assert_eq!(
            inputs.validate(),
            Err(InputError::UnsupportedUnits("stone".to_string()))
        );
    }

    #[test]
    fn zero_duration_is_rejected() {
        let inputs = AnalyzerInputs::default();
        assert_eq!(inputs.validate(), Err(InputError::NonPositiveDuration(0)));
    }

    #[test]
    fn deserializes_external_contract() {
        let inputs: AnalyzerInputs = serde_json::from_str(
            r#"{
                "instructions_url": "file:///tmp/rules.md",
                "history_url": "",
                "strava_recent": [{"name": "Run"}],
                "location": "gym:downtown",
                "equipment_inventory": ["barbell", "db_set_5-100"],
                "duration_minutes": 45,
                "units": "kg",
                "garmin_sleep_score": 0,
                "garmin_body_battery": null
            }"#,
        )
        .unwrap();
        assert_eq!(inputs.garmin_sleep_score, Some(0));
        assert_eq!(inputs.garmin_body_battery, None);
        assert!(inputs.recent_activity().is_some());
        assert_eq!(inputs.equipment_inventory.len(), 2);
    }

    #[test]
    fn null_activity_is_absent() {
        let inputs: AnalyzerInputs =
            serde_json::from_str(r#"{"strava_recent": null, "duration_minutes": 30}"#).unwrap();
        assert!(inputs.recent_activity().is_none());
    }
}
