//! Per-attempt records for debugging a phase run.

use serde::Serialize;

use super::error::{Phase, PipelineError};

/// What one attempt sent and got back.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptTrace {
    #[serde(serialize_with = "phase_str")]
    pub phase: Phase,
    /// 1-based.
    pub attempt: u32,
    pub system: String,
    pub user: String,
    /// Raw provider text; `None` when the call itself failed.
    pub raw: Option<String>,
    /// `None` on the accepted attempt.
    pub error: Option<String>,
}

fn phase_str<S: serde::Serializer>(phase: &Phase, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(phase)
}

impl AttemptTrace {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A phase result together with every attempt that led to it.
#[derive(Debug)]
pub struct Traced<T> {
    pub result: Result<T, PipelineError>,
    pub attempts: Vec<AttemptTrace>,
}

impl<T> Traced<T> {
    pub fn into_result(self) -> Result<T, PipelineError> {
        self.result
    }
}

/// Shorten `text` to its head and tail for log lines.
pub fn truncate_middle(text: &str, keep: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= keep * 2 {
        return text.to_string();
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head} ...[{} chars elided]... {tail}", chars.len() - keep * 2)
}
