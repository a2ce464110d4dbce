//! Artifact shapes, the schema documents they mirror, and validation.
//!
//! Each [`SchemaKind`] owns one embedded JSON Schema document. The document
//! is what gets sent to the completion provider and what the
//! [`SchemaValidator`] enforces; the typed structs in [`plan`] and
//! [`workout`] are kept in lockstep with it by the round-trip tests.

pub mod plan;
pub mod validator;
pub mod workout;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

pub use plan::{
    AnalyzerPlan, ExercisePlanEntry, ExerciseTargets, FatiguePolicy, GapFillPolicy,
    InstructionsContext, PlanMeta, SessionShape, SessionType, SupersetPolicy, Tier, TimeBudget,
    Units,
};
pub use validator::{ParsedArtifact, SchemaCompileError, SchemaValidator, SchemaViolation, ValidationError};
pub use workout::{SetKind, WORKOUT_VERSION, Workout, WorkoutMeta, WorkoutSet};

const ANALYZER_SCHEMA: &str = include_str!("../../schemas/analyzer-v1.json");
const WORKOUT_SCHEMA: &str = include_str!("../../schemas/workout-v1.2.json");

/// The artifact shapes the pipeline knows how to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    AnalyzerPlan,
    Workout,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 2] = [SchemaKind::AnalyzerPlan, SchemaKind::Workout];

    /// The raw schema document.
    pub fn document(&self) -> &'static str {
        match self {
            Self::AnalyzerPlan => ANALYZER_SCHEMA,
            Self::Workout => WORKOUT_SCHEMA,
        }
    }

    /// Response-format name sent to the provider.
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::AnalyzerPlan => "analyzer_plan",
            Self::Workout => "generator_output",
        }
    }

    /// Human description sent alongside the format name.
    pub fn description(&self) -> &'static str {
        match self {
            Self::AnalyzerPlan => "Workout analyzer plan JSON",
            Self::Workout => "Workout generator output JSON",
        }
    }

    /// Hex SHA-256 of the schema document, for tying artifacts to a revision.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.document().as_bytes()))
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnalyzerPlan => f.write_str("analyzer plan"),
            Self::Workout => f.write_str("workout"),
        }
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" | "analyzer" | "analyzer_plan" => Ok(Self::AnalyzerPlan),
            "workout" | "generator_output" => Ok(Self::Workout),
            other => Err(format!("unknown schema kind {other:?} (expected plan or workout)")),
        }
    }
}

/// A value the validator can produce from raw provider output.
pub trait Artifact: Serialize + DeserializeOwned + Send + 'static {
    const KIND: SchemaKind;
}

impl Artifact for AnalyzerPlan {
    const KIND: SchemaKind = SchemaKind::AnalyzerPlan;
}

impl Artifact for Workout {
    const KIND: SchemaKind = SchemaKind::Workout;
}
