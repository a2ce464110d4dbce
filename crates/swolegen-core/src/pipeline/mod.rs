//! Repair-retry orchestrator for the analyze and generate phases.
//!
//! Both phases run the same loop:
//!
//! ```text
//!   assemble ──> attempt ──valid──> done
//!                  │  ^
//!       invalid /  │  │ repair prompt (validation/rule failure)
//!       rejected   v  │ same request   (provider failure)
//!                retry? ──no──> exhausted
//! ```
//!
//! Attempts are strictly sequential. Cancellation is checked before each
//! attempt and raced against every fetch and provider call; a cancelled run
//! never makes another attempt.

pub mod config;
pub mod error;
pub mod trace;

use std::sync::Arc;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::fetch::ResourceFetcher;
use crate::inputs::AnalyzerInputs;
use crate::prompt::{
    ANALYZER_SYSTEM, AnalyzerPromptContext, GENERATOR_SYSTEM, build_analyzer_prompt,
    build_analyzer_repair, build_generator_prompt, build_generator_repair,
};
use crate::provider::{CompletionProvider, CompletionRequest};
use crate::rules::{RuleSet, RuleViolations};
use crate::schema::{AnalyzerPlan, Artifact, SchemaValidator, Workout};

pub use config::PipelineConfig;
pub use error::{AttemptFailure, ConfigError, Phase, PipelineError};
pub use trace::{AttemptTrace, Traced};

/// Source of "today" for the analyze prompt.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// A validated workout plus its line-oriented rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWorkout {
    pub workout: Workout,
    /// YAML document for downstream display.
    pub document: String,
}

/// Phase-specific pieces plugged into the shared loop.
struct PhaseJob<'a> {
    phase: Phase,
    system: &'static str,
    user: String,
    repair: &'a (dyn Fn(&[String], &str) -> String + Send + Sync),
}

pub struct Pipeline {
    provider: Arc<dyn CompletionProvider>,
    validator: SchemaValidator,
    fetcher: ResourceFetcher,
    rules: RuleSet,
    config: PipelineConfig,
    clock: Clock,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.provider.name())
            .field("rules", &self.rules)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Turn raw training context into a validated plan.
    pub async fn analyze(
        &self,
        inputs: &AnalyzerInputs,
        cancel: &CancellationToken,
    ) -> Result<AnalyzerPlan, PipelineError> {
        self.analyze_with_trace(inputs, cancel).await.into_result()
    }

    /// [`Pipeline::analyze`], also returning every attempt's prompts and output.
    pub async fn analyze_with_trace(
        &self,
        inputs: &AnalyzerInputs,
        cancel: &CancellationToken,
    ) -> Traced<AnalyzerPlan> {
        let span = tracing::info_span!("analyze", run_id = %Uuid::new_v4());
        let mut attempts = Vec::new();
        let result = self
            .analyze_inner(inputs, cancel, &mut attempts)
            .instrument(span)
            .await;
        Traced { result, attempts }
    }

    async fn analyze_inner(
        &self,
        inputs: &AnalyzerInputs,
        cancel: &CancellationToken,
        attempts: &mut Vec<AttemptTrace>,
    ) -> Result<AnalyzerPlan, PipelineError> {
        inputs.validate()?;
        let units = inputs.units()?;

        let instructions = self
            .fetch_document("instructions", &inputs.instructions_url, cancel)
            .await?;
        let history = self
            .fetch_document("history", &inputs.history_url, cancel)
            .await?;

        let ctx = AnalyzerPromptContext {
            instructions: &instructions,
            history: &history,
            today: (self.clock)(),
            units,
        };
        let user = build_analyzer_prompt(inputs, &ctx).map_err(|e| PipelineError::Encode {
            what: "analyze prompt",
            message: e.to_string(),
        })?;

        let repair = |failures: &[String], _original: &str| build_analyzer_repair(failures);
        let job = PhaseJob {
            phase: Phase::Analyze,
            system: ANALYZER_SYSTEM,
            user,
            repair: &repair,
        };
        self.run_phase::<AnalyzerPlan>(job, cancel, |_| Ok(()), attempts)
            .await
    }

    /// Expand a validated plan into a workout that passes the schema and
    /// every semantic rule.
    pub async fn generate(
        &self,
        plan: &AnalyzerPlan,
        cancel: &CancellationToken,
    ) -> Result<GeneratedWorkout, PipelineError> {
        self.generate_with_trace(plan, cancel).await.into_result()
    }

    pub async fn generate_with_trace(
        &self,
        plan: &AnalyzerPlan,
        cancel: &CancellationToken,
    ) -> Traced<GeneratedWorkout> {
        let span = tracing::info_span!("generate", run_id = %Uuid::new_v4());
        let mut attempts = Vec::new();
        let result = self
            .generate_inner(plan, cancel, &mut attempts)
            .instrument(span)
            .await;
        Traced { result, attempts }
    }

    async fn generate_inner(
        &self,
        plan: &AnalyzerPlan,
        cancel: &CancellationToken,
        attempts: &mut Vec<AttemptTrace>,
    ) -> Result<GeneratedWorkout, PipelineError> {
        let user = build_generator_prompt(plan).map_err(|e| PipelineError::Encode {
            what: "analyzer plan",
            message: e.to_string(),
        })?;

        let repair = |failures: &[String], original: &str| build_generator_repair(failures, original);
        let job = PhaseJob {
            phase: Phase::Generate,
            system: GENERATOR_SYSTEM,
            user,
            repair: &repair,
        };
        let workout = self
            .run_phase::<Workout>(job, cancel, |w| self.rules.evaluate(plan, w), attempts)
            .await?;

        let document = workout.to_yaml().map_err(|e| PipelineError::Encode {
            what: "workout document",
            message: e.to_string(),
        })?;
        Ok(GeneratedWorkout { workout, document })
    }

    async fn fetch_document(
        &self,
        document: &'static str,
        reference: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PipelineError::Cancelled { phase: Phase::Analyze, attempts: 0 });
            }
            r = self.fetcher.fetch(reference, self.config.max_fetch_bytes) => r,
        };
        let text = fetched.map_err(|source| PipelineError::Fetch { document, source })?;
        tracing::debug!(document, reference, bytes = text.len(), "fetched document");
        Ok(text)
    }

    /// The shared attempt/validate/repair loop.
    async fn run_phase<T: Artifact>(
        &self,
        job: PhaseJob<'_>,
        cancel: &CancellationToken,
        accept: impl Fn(&T) -> Result<(), RuleViolations>,
        traces: &mut Vec<AttemptTrace>,
    ) -> Result<T, PipelineError> {
        let kind = T::KIND;
        let max_attempts = self.config.max_attempts();
        let mut request = CompletionRequest::for_kind(kind, job.system, job.user.clone());
        let mut failures: Vec<AttemptFailure> = Vec::new();
        let mut repair_notes: Vec<String> = Vec::new();

        tracing::debug!(
            phase = %job.phase,
            format = kind.format_name(),
            schema = %kind.fingerprint(),
            provider = self.provider.name(),
            "starting phase"
        );

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    phase: job.phase,
                    attempts: attempt - 1,
                });
            }

            let completed = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                r = self.provider.complete(&request) => Some(r),
            };
            let Some(completed) = completed else {
                tracing::info!(phase = %job.phase, attempt, "cancelled during provider call");
                return Err(PipelineError::Cancelled {
                    phase: job.phase,
                    attempts: attempt,
                });
            };

            let (raw, failure) = match completed {
                Err(e) => (None, AttemptFailure::Provider(e)),
                Ok(raw) => {
                    tracing::debug!(phase = %job.phase, attempt, bytes = raw.len(), "provider replied");
                    match self.validator.parse::<T>(&raw) {
                        Ok(value) => match accept(&value) {
                            Ok(()) => {
                                traces.push(AttemptTrace {
                                    phase: job.phase,
                                    attempt,
                                    system: request.system_prompt.clone(),
                                    user: request.user_prompt.clone(),
                                    raw: Some(raw),
                                    error: None,
                                });
                                tracing::info!(phase = %job.phase, attempt, max_attempts, "phase succeeded");
                                return Ok(value);
                            }
                            Err(violations) => (Some(raw), AttemptFailure::Rules(violations)),
                        },
                        Err(e) => (Some(raw), AttemptFailure::Validation(e)),
                    }
                }
            };

            tracing::warn!(
                phase = %job.phase,
                attempt,
                max_attempts,
                error = %failure,
                "attempt failed"
            );
            traces.push(AttemptTrace {
                phase: job.phase,
                attempt,
                system: request.system_prompt.clone(),
                user: request.user_prompt.clone(),
                raw,
                error: Some(failure.to_string()),
            });

            if failure.needs_repair() {
                repair_notes.push(failure.to_string());
                if attempt < max_attempts {
                    let prompt = (job.repair)(&repair_notes, &job.user);
                    request = CompletionRequest::for_kind(kind, job.system, prompt);
                }
            }
            failures.push(failure);
        }

        tracing::info!(phase = %job.phase, attempts = failures.len(), "retry budget exhausted");
        Err(PipelineError::Exhausted {
            phase: job.phase,
            failures,
        })
    }
}

/// Assembles a [`Pipeline`]; nothing touches the network until `build`
/// has succeeded.
pub struct PipelineBuilder {
    provider: Option<Arc<dyn CompletionProvider>>,
    config: PipelineConfig,
    fetcher: Option<ResourceFetcher>,
    rules: RuleSet,
    clock: Option<Clock>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            provider: None,
            config: PipelineConfig::default(),
            fetcher: None,
            rules: RuleSet::standard(),
            clock: None,
        }
    }
}

impl PipelineBuilder {
    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    pub fn max_fetch_bytes(mut self, max_fetch_bytes: usize) -> Self {
        self.config.max_fetch_bytes = max_fetch_bytes;
        self
    }

    pub fn fetcher(mut self, fetcher: ResourceFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the post-validation rules (default: [`RuleSet::standard`]).
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Fix "today" to a constant date.
    pub fn fixed_date(self, date: NaiveDate) -> Self {
        self.clock(move || date)
    }

    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let provider = self.provider.ok_or(ConfigError::MissingProvider)?;
        self.config.validate()?;
        provider
            .validate_config()
            .map_err(|source| ConfigError::Provider {
                name: provider.name().to_string(),
                source,
            })?;
        let validator = SchemaValidator::new()?;

        Ok(Pipeline {
            provider,
            validator,
            fetcher: self.fetcher.unwrap_or_default(),
            rules: self.rules,
            config: self.config,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(|| chrono::Local::now().date_naive())),
        })
    }
}
