//! Shared fixtures for swolegen integration tests.
//!
//! The plan and workout fixtures are schema-valid and agree with each other
//! under the standard rule set, so tests only need to break the one thing
//! they are exercising.

use std::io::Write;

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use swolegen_core::inputs::AnalyzerInputs;
use swolegen_core::schema::{
    AnalyzerPlan, ExercisePlanEntry, ExerciseTargets, FatiguePolicy, GapFillPolicy,
    InstructionsContext, PlanMeta, SessionShape, SessionType, SetKind, SupersetPolicy, Tier,
    TimeBudget, Units, WORKOUT_VERSION, Workout, WorkoutMeta, WorkoutSet,
};

/// The date every fixture is pinned to.
pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid fixture date")
}

pub fn sample_plan() -> AnalyzerPlan {
    AnalyzerPlan {
        meta: PlanMeta {
            date: fixture_date(),
            location: "gym:downtown".to_string(),
            units: Units::Lbs,
            duration_minutes: 45,
            goal: "upper strength".to_string(),
            superset_policy: SupersetPolicy::PairsOk,
        },
        session: SessionShape {
            session_type: SessionType::Strength,
            tiers: vec![Tier::A, Tier::B],
            cut_order: vec![Tier::B],
        },
        fatigue_policy: FatiguePolicy {
            rir_shift: 1,
            load_cap_pct: 0.9,
            reason: "sleep score 58".to_string(),
        },
        time_budget: TimeBudget {
            target_set_count: 4,
            estimated_minutes_total: Some(40),
        },
        gap_fill_policy: GapFillPolicy {
            target_patterns: vec!["horizontal_pull".to_string()],
            min_sets_per_selected_pattern: None,
        },
        instructions_context: InstructionsContext {
            primary_goals: vec!["bench 225".to_string()],
            execution_principles: vec!["controlled eccentrics".to_string()],
            avoid: vec!["deadlifts".to_string()],
            encourage: vec!["rows".to_string()],
        },
        available_equipment: vec!["barbell".to_string(), "cable".to_string()],
        exercise_plan: vec![
            ExercisePlanEntry {
                tier: Tier::A,
                exercise: "Bench Press".to_string(),
                equipment: "barbell".to_string(),
                superset_with: None,
                warmups: 1,
                working_sets: 2,
                targets: ExerciseTargets {
                    rep_range: "5-6".to_string(),
                    rir: Some(2),
                    target_load: Some(185.0),
                    load_cap: Some(195.0),
                },
            },
            ExercisePlanEntry {
                tier: Tier::B,
                exercise: "Cable Row".to_string(),
                equipment: "cable".to_string(),
                superset_with: None,
                warmups: 0,
                working_sets: 1,
                targets: ExerciseTargets {
                    rep_range: "10".to_string(),
                    rir: None,
                    target_load: None,
                    load_cap: None,
                },
            },
        ],
    }
}

fn set(
    id: &str,
    tier: Tier,
    exercise: &str,
    equipment: &str,
    kind: SetKind,
    reps: u32,
    load: Option<f64>,
) -> WorkoutSet {
    WorkoutSet {
        id: id.to_string(),
        tier,
        exercise: exercise.to_string(),
        equipment: equipment.to_string(),
        kind,
        target_reps: reps,
        target_load: load,
        rir: if kind == SetKind::Working { Some(2) } else { None },
        rest_sec: Some(120),
        superset: None,
    }
}

/// A workout expanding [`sample_plan`], with no superset tags.
pub fn sample_workout() -> Workout {
    Workout {
        version: WORKOUT_VERSION.to_string(),
        meta: WorkoutMeta {
            date: fixture_date(),
            location: "gym:downtown".to_string(),
            units: Units::Lbs,
            duration_minutes: 45,
            goal: "upper strength".to_string(),
        },
        sets: vec![
            set("A1.w1", Tier::A, "Bench Press", "barbell", SetKind::Warmup, 8, Some(95.0)),
            set("A1.1", Tier::A, "Bench Press", "barbell", SetKind::Working, 6, Some(185.0)),
            set("A1.2", Tier::A, "Bench Press", "barbell", SetKind::Working, 6, Some(185.0)),
            set("B1.1", Tier::B, "Cable Row", "cable", SetKind::Working, 10, None),
        ],
        notes: vec!["Stop a set early if bar speed drops.".to_string()],
    }
}

/// Analyze inputs with no referenced documents and no recovery scores.
pub fn sample_inputs() -> AnalyzerInputs {
    AnalyzerInputs {
        location: "gym:downtown".to_string(),
        equipment_inventory: vec!["barbell".to_string(), "cable".to_string()],
        duration_minutes: 45,
        ..Default::default()
    }
}

pub fn plan_json() -> String {
    serde_json::to_string(&sample_plan()).expect("plan serializes")
}

pub fn workout_json() -> String {
    serde_json::to_string(&sample_workout()).expect("workout serializes")
}

/// A plan document missing its required `meta` object.
pub fn plan_json_without_meta() -> String {
    let mut value = serde_json::to_value(sample_plan()).expect("plan serializes");
    value
        .as_object_mut()
        .expect("plan is an object")
        .remove("meta");
    value.to_string()
}

/// Write `contents` to a temp file that lives as long as the handle.
pub fn temp_document(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp file");
    file.flush().expect("failed to flush temp file");
    file
}
