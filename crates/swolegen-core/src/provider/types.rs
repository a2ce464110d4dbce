//! Shared types for completion providers.

use thiserror::Error;

use crate::schema::SchemaKind;

/// Everything a provider needs for one completion.
///
/// Built fresh for every attempt, repairs included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Response-format name (e.g. `analyzer_plan`).
    pub format_name: String,
    /// Human description of the expected output.
    pub description: String,
    /// JSON Schema document the output must satisfy.
    pub schema: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl CompletionRequest {
    /// Build a request whose format, description and schema come from `kind`.
    pub fn for_kind(kind: SchemaKind, system_prompt: &str, user_prompt: String) -> Self {
        Self {
            format_name: kind.format_name().to_string(),
            description: kind.description().to_string(),
            schema: kind.document().to_string(),
            system_prompt: system_prompt.to_string(),
            user_prompt,
        }
    }
}

/// A single failed provider call.
///
/// The orchestrator only distinguishes success from failure; the variants
/// exist for logs and for [`CompletionProvider::validate_config`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider misconfigured: {0}")]
    Config(String),

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider response had no message content")]
    NoContent,

    #[error("provider refused: {0}")]
    Refused(String),

    #[error("{0}")]
    Other(String),
}
