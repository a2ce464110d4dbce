//! Generate-phase prompts: validated plan in, concrete workout out.

use crate::schema::{AnalyzerPlan, WORKOUT_VERSION};

use super::render_failures;

/// Fixed system prompt for the generate phase.
pub const GENERATOR_SYSTEM: &str = "\
You expand a structured training plan into a concrete workout. Emit every \
warm-up and working set in execution order with a unique id, its tier, \
exercise, equipment, target reps and load. Respect the plan's superset \
policy and units. Respond with a single JSON object that conforms exactly \
to the workout schema. Do not add commentary or Markdown.";

/// Render the initial generate user prompt around the serialized plan.
pub fn build_generator_prompt(plan: &AnalyzerPlan) -> Result<String, serde_json::Error> {
    let plan_json = serde_json::to_string(plan)?;
    Ok(format!(
        "Expand this analyzer plan into a version {WORKOUT_VERSION} workout.\n\nplan: {plan_json}\n"
    ))
}

/// Render a repair prompt grounded on the original request.
pub fn build_generator_repair(failures: &[String], original_prompt: &str) -> String {
    let mut prompt = String::with_capacity(original_prompt.len() + 512);
    prompt.push_str("Your previous response was rejected:\n");
    prompt.push_str(&render_failures(failures));
    prompt.push_str("\n\nFix every problem above and answer the original request again.\n\n");
    prompt.push_str(original_prompt);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_repeats_original_request() {
        let prompt = build_generator_repair(
            &["sets: required".to_string(), "superset-policy: tags".to_string()],
            "ORIGINAL",
        );
        assert!(prompt.contains("1. sets: required\n2. superset-policy: tags"));
        assert!(prompt.ends_with("ORIGINAL"));
    }
}
