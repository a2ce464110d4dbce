//! `swolegen analyze`, `generate` and `run`: drive the pipeline from files.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use swolegen_core::activity::{ActivityClient, activities_to_json};
use swolegen_core::inputs::AnalyzerInputs;
use swolegen_core::pipeline::trace::truncate_middle;
use swolegen_core::pipeline::{AttemptTrace, Pipeline};
use swolegen_core::schema::{AnalyzerPlan, SchemaValidator};

use crate::config::SwolegenConfig;

/// Longest head/tail kept per prompt or reply in `--trace` output.
const TRACE_KEEP: usize = 400;

/// Options shared by the commands that start from analyze inputs.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub strava_days: Option<u32>,
    pub trace: bool,
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write to `path`, or stdout when `None`.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{contents}");
            if !contents.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

fn log_traces(traces: &[AttemptTrace]) {
    for t in traces {
        tracing::info!(
            phase = %t.phase,
            attempt = t.attempt,
            ok = t.succeeded(),
            system = %truncate_middle(&t.system, TRACE_KEEP),
            user = %truncate_middle(&t.user, TRACE_KEEP),
            raw = %t.raw.as_deref().map(|r| truncate_middle(r, TRACE_KEEP)).unwrap_or_default(),
            error = t.error.as_deref().unwrap_or(""),
            "attempt trace"
        );
    }
}

/// Parse analyze inputs and, when asked, fill `strava_recent` from the
/// activity endpoint.
async fn load_inputs(
    input: &Path,
    config: &SwolegenConfig,
    options: &AnalyzeOptions,
) -> Result<AnalyzerInputs> {
    let raw = read_source(input)?;
    let mut inputs: AnalyzerInputs =
        serde_json::from_str(&raw).with_context(|| format!("invalid inputs in {}", input.display()))?;

    if let Some(days) = options.strava_days {
        if inputs.recent_activity().is_some() {
            tracing::debug!("inputs already carry strava_recent; skipping activity fetch");
        } else {
            let token = config
                .strava_token
                .as_deref()
                .context("--strava-days needs STRAVA_ACCESS_TOKEN or strava.access_token")?;
            let client = ActivityClient::new(config.strava_base_url.clone());
            let activities = client
                .recent_activities(token, Some(days))
                .await
                .context("failed to fetch recent activity")?;
            tracing::info!(count = activities.len(), days, "loaded recent activity");
            inputs.strava_recent = Some(activities_to_json(&activities));
        }
    }
    Ok(inputs)
}

async fn analyze(
    pipeline: &Pipeline,
    inputs: &AnalyzerInputs,
    options: &AnalyzeOptions,
    cancel: &CancellationToken,
) -> Result<AnalyzerPlan> {
    let traced = pipeline.analyze_with_trace(inputs, cancel).await;
    if options.trace {
        log_traces(&traced.attempts);
    }
    traced.result.context("analyze failed")
}

/// Execute `swolegen analyze`: print the validated plan as JSON.
pub async fn run_analyze(
    config: &SwolegenConfig,
    input: &Path,
    output: Option<&Path>,
    options: &AnalyzeOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let pipeline = config.build_pipeline()?;
    let inputs = load_inputs(input, config, options).await?;
    let plan = analyze(&pipeline, &inputs, options, cancel).await?;
    let json = serde_json::to_string_pretty(&plan).context("failed to encode plan")?;
    write_output(output, &json)
}

/// Execute `swolegen generate`: expand a plan file into a workout document.
pub async fn run_generate(
    config: &SwolegenConfig,
    plan_path: &Path,
    output: Option<&Path>,
    trace: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let pipeline = config.build_pipeline()?;
    let raw = read_source(plan_path)?;
    let validator = SchemaValidator::new().context("failed to compile schemas")?;
    let plan: AnalyzerPlan = validator
        .parse(&raw)
        .with_context(|| format!("{} is not a valid analyzer plan", plan_path.display()))?;

    let traced = pipeline.generate_with_trace(&plan, cancel).await;
    if trace {
        log_traces(&traced.attempts);
    }
    let generated = traced.result.context("generate failed")?;
    write_output(output, &generated.document)
}

/// Execute `swolegen run`: analyze, then generate from the fresh plan.
pub async fn run_run(
    config: &SwolegenConfig,
    input: &Path,
    output: Option<&Path>,
    plan_output: Option<&Path>,
    options: &AnalyzeOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let pipeline = config.build_pipeline()?;
    let inputs = load_inputs(input, config, options).await?;
    let plan = analyze(&pipeline, &inputs, options, cancel).await?;

    if let Some(path) = plan_output {
        let json = serde_json::to_string_pretty(&plan).context("failed to encode plan")?;
        write_output(Some(path), &json)?;
    }

    let traced = pipeline.generate_with_trace(&plan, cancel).await;
    if options.trace {
        log_traces(&traced.attempts);
    }
    let generated = traced.result.context("generate failed")?;
    write_output(output, &generated.document)
}
