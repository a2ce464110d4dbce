//! Structural validation of raw provider output.
//!
//! Validation runs in three steps, each with its own failure variant:
//! JSON parse, schema check against the embedded document, typed decode.
//! All three surface as [`ValidationError`] so the orchestrator treats them
//! alike, but the text keeps the field path and constraint for repair
//! prompts.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use thiserror::Error;

use super::{AnalyzerPlan, Artifact, SchemaKind, Workout};

/// One schema constraint violated by an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer into the instance (`/exercise_plan/0/tier`).
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Why raw output was rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("{kind} output is empty")]
    Empty { kind: SchemaKind },

    #[error("{kind} output is not valid JSON at line {line}, column {column}: {message}")]
    Parse {
        kind: SchemaKind,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{kind} output violates schema: {}", render_violations(.violations))]
    Schema {
        kind: SchemaKind,
        violations: Vec<SchemaViolation>,
    },

    #[error("{kind} output could not be decoded: {message}")]
    Decode { kind: SchemaKind, message: String },
}

fn render_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// An embedded schema document failed to compile.
#[derive(Debug, Clone, Error)]
#[error("embedded {kind} schema is invalid: {message}")]
pub struct SchemaCompileError {
    pub kind: SchemaKind,
    pub message: String,
}

/// Result of validating against a kind chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedArtifact {
    Plan(AnalyzerPlan),
    Workout(Workout),
}

/// Compiled validators for every [`SchemaKind`].
pub struct SchemaValidator {
    analyzer: JSONSchema,
    workout: JSONSchema,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("kinds", &SchemaKind::ALL)
            .finish()
    }
}

impl SchemaValidator {
    /// Compile the embedded schema documents.
    pub fn new() -> Result<Self, SchemaCompileError> {
        Ok(Self {
            analyzer: compile(SchemaKind::AnalyzerPlan)?,
            workout: compile(SchemaKind::Workout)?,
        })
    }

    fn compiled(&self, kind: SchemaKind) -> &JSONSchema {
        match kind {
            SchemaKind::AnalyzerPlan => &self.analyzer,
            SchemaKind::Workout => &self.workout,
        }
    }

    /// Parse `raw` and check it against the schema for `kind`.
    ///
    /// Returns the parsed JSON value on success.
    pub fn check(&self, kind: SchemaKind, raw: &str) -> Result<Value, ValidationError> {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Err(ValidationError::Empty { kind });
        }

        let value: Value = serde_json::from_str(body).map_err(|e| ValidationError::Parse {
            kind,
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;

        let violations: Vec<SchemaViolation> = match self.compiled(kind).validate(&value) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| SchemaViolation {
                    path: e.instance_path.to_string(),
                    message: e.to_string(),
                })
                .collect(),
        };
        if !violations.is_empty() {
            return Err(ValidationError::Schema { kind, violations });
        }

        Ok(value)
    }

    /// Validate `raw` and decode it into the artifact type `T`.
    pub fn parse<T: Artifact>(&self, raw: &str) -> Result<T, ValidationError> {
        let value = self.check(T::KIND, raw)?;
        serde_json::from_value(value).map_err(|e| ValidationError::Decode {
            kind: T::KIND,
            message: e.to_string(),
        })
    }

    /// Validate `raw` against a kind selected at runtime.
    pub fn validate(&self, kind: SchemaKind, raw: &str) -> Result<ParsedArtifact, ValidationError> {
        match kind {
            SchemaKind::AnalyzerPlan => self.parse::<AnalyzerPlan>(raw).map(ParsedArtifact::Plan),
            SchemaKind::Workout => self.parse::<Workout>(raw).map(ParsedArtifact::Workout),
        }
    }
}

fn compile(kind: SchemaKind) -> Result<JSONSchema, SchemaCompileError> {
    let document: Value =
        serde_json::from_str(kind.document()).map_err(|e| SchemaCompileError {
            kind,
            message: e.to_string(),
        })?;
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&document)
        .map_err(|e| SchemaCompileError {
            kind,
            message: e.to_string(),
        })
}

/// Strip a surrounding Markdown code fence (```json ... ```), if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
