//! Typed mirror of `schemas/workout-v1.2.json`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::plan::{Tier, Units};

/// Document version this crate produces and accepts.
pub const WORKOUT_VERSION: &str = "1.2";

/// Validated output of the generate phase: the plan expanded into sets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub version: String,
    pub meta: WorkoutMeta,
    /// Every set in execution order.
    pub sets: Vec<WorkoutSet>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutMeta {
    pub date: NaiveDate,
    pub location: String,
    pub units: Units,
    pub duration_minutes: u32,
    pub goal: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SetKind {
    Warmup,
    Working,
}

/// A single concrete set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    /// Identifier unique within the workout, e.g. `A1.2`.
    pub id: String,
    pub tier: Tier,
    pub exercise: String,
    pub equipment: String,
    pub kind: SetKind,
    pub target_reps: u32,
    pub target_load: Option<f64>,
    pub rir: Option<u8>,
    pub rest_sec: Option<u32>,
    /// Pairing tag shared by sets performed back to back.
    pub superset: Option<String>,
}

impl Workout {
    /// Sets that carry a superset tag.
    pub fn superset_sets(&self) -> impl Iterator<Item = &WorkoutSet> {
        self.sets.iter().filter(|s| s.superset.is_some())
    }

    /// Render the line-oriented YAML document handed to downstream display.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
