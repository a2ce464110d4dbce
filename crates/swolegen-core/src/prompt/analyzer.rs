//! Analyze-phase prompts: raw training context in, structured plan out.

use chrono::NaiveDate;

use crate::inputs::AnalyzerInputs;
use crate::schema::{SchemaKind, Units};

use super::{indent_block, render_failures};

/// Fixed system prompt for the analyze phase.
pub const ANALYZER_SYSTEM: &str = "\
You are a strength coach's planning assistant. Read the athlete's rules, \
training history, recent cardio load and recovery signals, then decide \
today's session. Respond with a single JSON object that conforms exactly to \
the analyzer plan schema. Do not add commentary or Markdown.";

/// Values resolved by the pipeline before the prompt is rendered.
#[derive(Debug, Clone)]
pub struct AnalyzerPromptContext<'a> {
    /// Fetched instructions document (possibly empty or truncated).
    pub instructions: &'a str,
    /// Fetched history document (possibly empty or truncated).
    pub history: &'a str,
    /// Session date; always the clock's today, never caller supplied.
    pub today: NaiveDate,
    pub units: Units,
}

/// Render the initial analyze user prompt.
///
/// Absent recovery scores and activity render as the literal `null` so the
/// model cannot mistake "not measured" for a measured zero.
pub fn build_analyzer_prompt(
    inputs: &AnalyzerInputs,
    ctx: &AnalyzerPromptContext<'_>,
) -> Result<String, serde_json::Error> {
    let activity = match inputs.recent_activity() {
        Some(value) => serde_json::to_string(value)?,
        None => "null".to_string(),
    };
    let equipment = serde_json::to_string(&inputs.equipment_inventory)?;
    let cardio = serde_json::to_string(&inputs.upcoming_cardio_text)?;

    let mut prompt = String::with_capacity(ctx.instructions.len() + ctx.history.len() + 1024);
    prompt.push_str("Plan today's session from the context below.\n\n");
    prompt.push_str("inputs:\n");
    prompt.push_str("  instructions: |\n");
    prompt.push_str(&indent_block(ctx.instructions, 4));
    prompt.push('\n');
    prompt.push_str("  history: |\n");
    prompt.push_str(&indent_block(ctx.history, 4));
    prompt.push('\n');
    prompt.push_str(&format!("  strava_recent: {activity}\n"));
    prompt.push_str(&format!("  upcoming_cardio_text: {cardio}\n"));
    prompt.push_str(&format!(
        "  garmin_sleep_score: {}\n",
        optional_score(inputs.garmin_sleep_score)
    ));
    prompt.push_str(&format!(
        "  garmin_body_battery: {}\n",
        optional_score(inputs.garmin_body_battery)
    ));
    prompt.push_str(&format!("  equipment_inventory: {equipment}\n"));
    prompt.push_str(&format!("  date: {}\n", ctx.today.format("%Y-%m-%d")));
    prompt.push_str(&format!("  location: {}\n", inputs.location));
    prompt.push_str(&format!("  units: {}\n", ctx.units));
    prompt.push_str(&format!("  duration_minutes: {}\n", inputs.duration_minutes));
    Ok(prompt)
}

/// Render a repair prompt grounded on the plan schema.
pub fn build_analyzer_repair(failures: &[String]) -> String {
    let mut prompt = String::with_capacity(SchemaKind::AnalyzerPlan.document().len() + 512);
    prompt.push_str("Your previous response was rejected:\n");
    prompt.push_str(&render_failures(failures));
    prompt.push_str("\n\nReturn ONLY a corrected JSON object. It must conform to this schema:\n");
    prompt.push_str(SchemaKind::AnalyzerPlan.document());
    prompt
}

fn optional_score(score: Option<i64>) -> String {
    score.map_or_else(|| "null".to_string(), |s| s.to_string())
}
