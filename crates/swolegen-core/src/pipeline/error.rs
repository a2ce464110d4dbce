//! Error taxonomy for pipeline runs.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::inputs::InputError;
use crate::provider::ProviderError;
use crate::rules::RuleViolations;
use crate::schema::{SchemaCompileError, ValidationError};

/// Which state machine produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Analyze,
    Generate,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analyze => f.write_str("analyze"),
            Self::Generate => f.write_str("generate"),
        }
    }
}

/// Rejected before any network activity; never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no completion provider configured")]
    MissingProvider,

    #[error("retry count must be non-negative, got {0}")]
    InvalidRetries(i64),

    #[error("max fetch bytes must be positive, got {0}")]
    InvalidFetchCap(i64),

    #[error("provider {name} is misconfigured: {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaCompileError),
}

/// Why one attempt did not produce an accepted artifact.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Provider(ProviderError),

    #[error(transparent)]
    Validation(ValidationError),

    #[error(transparent)]
    Rules(RuleViolations),
}

impl AttemptFailure {
    /// Validation and rule failures change the next prompt; provider
    /// failures resend the same request.
    pub fn needs_repair(&self) -> bool {
        !matches!(self, Self::Provider(_))
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("failed to fetch {document} document: {source}")]
    Fetch {
        document: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("failed to encode {what}: {message}")]
    Encode { what: &'static str, message: String },

    #[error("{phase} cancelled after {attempts} attempt(s)")]
    Cancelled { phase: Phase, attempts: u32 },

    #[error(
        "{phase} failed after {} attempt(s): {}",
        .failures.len(),
        render_failures(.failures)
    )]
    Exhausted {
        phase: Phase,
        failures: Vec<AttemptFailure>,
    },
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn render_failures(failures: &[AttemptFailure]) -> String {
    failures
        .iter()
        .enumerate()
        .map(|(i, f)| format!("attempt {}: {f}", i + 1))
        .collect::<Vec<_>>()
        .join("; ")
}
