//! Prompt assembly for both phases.
//!
//! Pure string building (no I/O). Prompts are YAML-flavoured blocks so
//! multi-line documents survive as literal blocks.

pub mod analyzer;
pub mod generator;

pub use analyzer::{ANALYZER_SYSTEM, AnalyzerPromptContext, build_analyzer_prompt, build_analyzer_repair};
pub use generator::{GENERATOR_SYSTEM, build_generator_prompt, build_generator_repair};

/// Indent every line of `text` by `width` spaces for a YAML literal block.
pub(crate) fn indent_block(text: &str, width: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render prior failures as a numbered list for a repair prompt.
pub(crate) fn render_failures(failures: &[String]) -> String {
    failures
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {f}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
