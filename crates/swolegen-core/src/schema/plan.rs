//! Typed mirror of `schemas/analyzer-v1.json`.
//!
//! The schema document is the source of truth. Every property is required
//! there and optional values are nullable, so these types serialize `None`
//! as `null` rather than skipping the field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Validated output of the analyze phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerPlan {
    pub meta: PlanMeta,
    pub session: SessionShape,
    pub fatigue_policy: FatiguePolicy,
    pub time_budget: TimeBudget,
    pub gap_fill_policy: GapFillPolicy,
    pub instructions_context: InstructionsContext,
    pub available_equipment: Vec<String>,
    pub exercise_plan: Vec<ExercisePlanEntry>,
}

/// Session metadata in `meta`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanMeta {
    pub date: NaiveDate,
    /// Location key such as `gym:downtown`, `home` or `hotel:marriott`.
    pub location: String,
    pub units: Units,
    pub duration_minutes: u32,
    pub goal: String,
    pub superset_policy: SupersetPolicy,
}

/// Load units used throughout a plan and its workout.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Lbs,
    Kg,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lbs => "lbs",
            Self::Kg => "kg",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lbs" => Ok(Self::Lbs),
            "kg" => Ok(Self::Kg),
            other => Err(format!("unsupported units {other:?} (expected lbs or kg)")),
        }
    }
}

/// How the generated workout may pair exercises.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SupersetPolicy {
    /// No supersets at all.
    None,
    /// Pairing allowed where it saves time.
    PairsOk,
    /// Pairing encouraged.
    Preferred,
    /// At least one superset must appear.
    Required,
}

impl std::fmt::Display for SupersetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::PairsOk => "pairs_ok",
            Self::Preferred => "preferred",
            Self::Required => "required",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Strength,
    Hypertrophy,
    Power,
    Mixed,
}

/// Priority tier. `A` work is kept longest under time pressure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    A,
    B,
    C,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionShape {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Tiers present in the session, in execution order.
    pub tiers: Vec<Tier>,
    /// Tiers to drop first when the session runs long.
    pub cut_order: Vec<Tier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FatiguePolicy {
    /// Reps-in-reserve added to every target when recovery is poor.
    pub rir_shift: u8,
    /// Fraction (0..=1) of normal working load allowed today.
    pub load_cap_pct: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeBudget {
    pub target_set_count: u32,
    pub estimated_minutes_total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GapFillPolicy {
    pub target_patterns: Vec<String>,
    pub min_sets_per_selected_pattern: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructionsContext {
    pub primary_goals: Vec<String>,
    pub execution_principles: Vec<String>,
    pub avoid: Vec<String>,
    pub encourage: Vec<String>,
}

/// One exercise in `exercise_plan`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExercisePlanEntry {
    pub tier: Tier,
    pub exercise: String,
    pub equipment: String,
    /// Name of the exercise this one is paired with, if any.
    pub superset_with: Option<String>,
    pub warmups: u32,
    pub working_sets: u32,
    pub targets: ExerciseTargets,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseTargets {
    /// `"8"` or `"6-8"`.
    pub rep_range: String,
    pub rir: Option<u8>,
    pub target_load: Option<f64>,
    pub load_cap: Option<f64>,
}
