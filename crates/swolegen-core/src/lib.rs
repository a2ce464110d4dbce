//! Validated-completion pipeline for workout planning.
//!
//! Raw training context goes through two model-backed phases: analyze
//! (context to [`schema::AnalyzerPlan`]) and generate (plan to
//! [`schema::Workout`]). Model output is never trusted; every artifact that
//! leaves [`pipeline::Pipeline`] has passed schema validation, and workouts
//! have also passed the semantic [`rules`].

pub mod activity;
pub mod fetch;
pub mod inputs;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod rules;
pub mod schema;

pub use inputs::{AnalyzerInputs, InputError};
pub use pipeline::{GeneratedWorkout, Pipeline, PipelineConfig, PipelineError};
