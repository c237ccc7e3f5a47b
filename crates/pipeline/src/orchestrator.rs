//! Self-healing orchestrator: the bounded attempt loop.
//!
//! Each attempt runs generation, static analysis, conditional remediation
//! and rendering in sequence. A failed attempt feeds its diagnostic into the
//! next one; the loop ends on the first successful render or after the
//! attempt ceiling. Every transition is persisted through [`JobStore`].

use std::future::Future;
use std::sync::Arc;

use framesmith_core::error_context::enhance_error_context;
use framesmith_core::generation::{GenerationOptions, GenerationResult};
use framesmith_core::job::{JobStore, JobUpdate};
use framesmith_core::naming::scene_class_name;
use framesmith_core::render::{RenderOutcome, RenderRequest, Renderer};
use framesmith_core::spec::TechnicalSpecification;
use framesmith_core::static_analysis::{critical_issues, severity_counts, validate};
use framesmith_core::text_generation::TextGenerator;
use framesmith_core::types::DbId;
use tokio_util::sync::CancellationToken;

use crate::code_generator::{CodeGenerator, GeneratorInput};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::remediator::{IssueRemediator, Remediation};
use crate::spec_enhancer::SpecificationEnhancer;

/// Error recorded when a job is stopped through its cancellation token.
pub const CANCELLED_MESSAGE: &str = "Job cancelled";

/// Error recorded when the renderer reports failure without a message.
const UNKNOWN_RENDER_ERROR: &str = "Render failed without an error message";

/// Why an attempt did not produce a video.
#[derive(Debug)]
enum AttemptFailure {
    /// The renderer ran the script and reported failure.
    Render {
        error: String,
        logs: String,
        stderr: String,
    },
    /// A stage failed before a render outcome existed.
    Stage(PipelineError),
}

impl From<PipelineError> for AttemptFailure {
    fn from(e: PipelineError) -> Self {
        AttemptFailure::Stage(e)
    }
}

/// State carried from one attempt to the next.
#[derive(Debug, Default)]
struct AttemptState {
    specification: Option<TechnicalSpecification>,
    last_code: Option<String>,
    last_error: Option<String>,
    /// Output of every failed render so far, oldest first.
    logs: String,
    stderr: String,
}

pub struct SelfHealingPipeline {
    enhancer: SpecificationEnhancer,
    generator: CodeGenerator,
    remediator: IssueRemediator,
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn JobStore>,
    config: PipelineConfig,
}

impl SelfHealingPipeline {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn JobStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            enhancer: SpecificationEnhancer::new(Arc::clone(&text)),
            generator: CodeGenerator::new(Arc::clone(&text)),
            remediator: IssueRemediator::new(text),
            renderer,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a job with the standard attempt ceiling.
    pub async fn run(
        &self,
        job_id: DbId,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        self.run_with_ceiling(job_id, options, self.config.max_retries, cancel)
            .await
    }

    /// Run the degraded variant of a job whose speech synthesis failed:
    /// voiceover off, reduced attempt ceiling.
    ///
    /// `job_id` must be the degraded job's own row. Retry counts restart at
    /// zero, so reusing the failed parent's id would move its count backwards.
    pub async fn run_without_voiceover(
        &self,
        job_id: DbId,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let degraded = options.without_voiceover();
        tracing::info!(job_id, "Running job without voiceover");
        self.run_with_ceiling(job_id, &degraded, self.config.degraded_max_retries, cancel)
            .await
    }

    async fn run_with_ceiling(
        &self,
        job_id: DbId,
        options: &GenerationOptions,
        max_retries: u32,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let max_retries = max_retries.max(1);
        let scene_name = scene_class_name(&options.title);
        let mut state = AttemptState::default();

        for attempt in 1..=max_retries {
            let retry_count = attempt - 1;

            if cancel.is_cancelled() {
                return self.cancelled(job_id, retry_count, &scene_name, state).await;
            }

            self.persist(
                job_id,
                JobUpdate::processing(retry_count, state.last_error.clone()),
            )
            .await;
            tracing::info!(job_id, attempt, max_retries, "Attempt started");

            match self
                .run_attempt(job_id, attempt, options, &scene_name, &mut state, cancel)
                .await
            {
                Ok(outcome) => {
                    tracing::info!(job_id, attempt, "Render succeeded");
                    self.persist(
                        job_id,
                        JobUpdate::completed(
                            retry_count,
                            outcome.output_url.clone(),
                            outcome.logs.clone(),
                            outcome.stderr.clone(),
                        ),
                    )
                    .await;
                    return GenerationResult {
                        success: true,
                        code: state.last_code.unwrap_or_default(),
                        scene_name,
                        output_url: outcome.output_url,
                        logs: outcome.logs,
                        stderr: outcome.stderr,
                        retry_count,
                        error: None,
                    };
                }
                Err(AttemptFailure::Stage(PipelineError::Cancelled)) => {
                    return self.cancelled(job_id, retry_count, &scene_name, state).await;
                }
                Err(AttemptFailure::Render {
                    error,
                    logs,
                    stderr,
                }) => {
                    tracing::warn!(job_id, attempt, error = %error, "Render failed");
                    state.last_error = Some(enhance_error_context(&error, &stderr, attempt));
                    append_output(&mut state.logs, &logs);
                    append_output(&mut state.stderr, &stderr);
                }
                Err(AttemptFailure::Stage(e)) => {
                    tracing::warn!(job_id, attempt, error = %e, "Attempt failed before rendering");
                    state.last_error = Some(e.to_string());
                }
            }
        }

        let retry_count = max_retries - 1;
        let error = state
            .last_error
            .clone()
            .unwrap_or_else(|| "Generation failed".to_string());
        tracing::error!(job_id, attempts = max_retries, error = %error, "Job failed");

        self.persist(
            job_id,
            JobUpdate::failed(
                retry_count,
                error.clone(),
                state.logs.clone(),
                state.stderr.clone(),
            ),
        )
        .await;

        GenerationResult {
            success: false,
            code: state.last_code.unwrap_or_default(),
            scene_name,
            output_url: None,
            logs: state.logs,
            stderr: state.stderr,
            retry_count,
            error: Some(error),
        }
    }

    /// One pass through generate, validate, remediate and render.
    async fn run_attempt(
        &self,
        job_id: DbId,
        attempt: u32,
        options: &GenerationOptions,
        scene_name: &str,
        state: &mut AttemptState,
        cancel: &CancellationToken,
    ) -> Result<RenderOutcome, AttemptFailure> {
        let spec: &TechnicalSpecification = match state.specification {
            Some(ref spec) => spec,
            None => {
                let outcome = cancellable(cancel, self.enhancer.enhance(options)).await?;
                if outcome.is_fallback() {
                    tracing::info!(job_id, "Using fallback specification");
                }
                &*state.specification.insert(outcome.into_specification())
            }
        };

        let input = match (&state.last_code, &state.last_error) {
            (Some(previous_code), Some(error)) => GeneratorInput::Fix {
                previous_code,
                error,
            },
            _ => GeneratorInput::Specification(spec),
        };

        let generated = cancellable(cancel, self.generator.generate(input, options)).await??;
        self.persist(job_id, JobUpdate::code(&generated.code)).await;

        let code = self.check_and_remediate(job_id, attempt, generated.code, options, cancel).await?;
        state.last_code = Some(code.clone());

        let request = RenderRequest {
            upload_target: self.config.upload_target(job_id, scene_name),
            code,
            scene_name: scene_name.to_string(),
            resolution: options.resolution.clone(),
            aspect_ratio: options.aspect_ratio.clone(),
            duration_secs: options.duration_secs,
            style: options.style.clone(),
        };

        let outcome = cancellable(cancel, self.renderer.render(request))
            .await?
            .map_err(PipelineError::from)?;

        if outcome.success {
            Ok(outcome)
        } else {
            Err(AttemptFailure::Render {
                error: outcome
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_RENDER_ERROR.to_string()),
                logs: outcome.logs,
                stderr: outcome.stderr,
            })
        }
    }

    /// Validate the script and repair critical issues. The second validation
    /// is informational; rendering proceeds either way.
    async fn check_and_remediate(
        &self,
        job_id: DbId,
        attempt: u32,
        code: String,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let issues = validate(&code, options.expected_voice());
        let [critical, high, medium, low] = severity_counts(&issues);
        tracing::info!(job_id, attempt, critical, high, medium, low, "Static analysis complete");

        if critical == 0 {
            return Ok(code);
        }
        for issue in critical_issues(&issues) {
            tracing::warn!(
                job_id,
                line = issue.line,
                pattern = %issue.pattern,
                severity = issue.severity.as_str(),
                "Critical issue found",
            );
        }

        let remediation = cancellable(cancel, self.remediator.remediate(&code, &issues)).await?;
        tracing::info!(job_id, attempt, strategy = remediation.label(), "Remediation finished");

        if matches!(remediation, Remediation::Unchanged(_)) {
            return Ok(remediation.into_code());
        }
        let fixed = remediation.into_code();

        let remaining = validate(&fixed, options.expected_voice());
        tracing::info!(
            job_id,
            attempt,
            remaining_critical = critical_issues(&remaining).len(),
            "Re-validated remediated code",
        );

        if fixed != code {
            self.persist(job_id, JobUpdate::code(&fixed)).await;
        }
        Ok(fixed)
    }

    async fn cancelled(
        &self,
        job_id: DbId,
        retry_count: u32,
        scene_name: &str,
        state: AttemptState,
    ) -> GenerationResult {
        tracing::warn!(job_id, retry_count, "Job cancelled");
        self.persist(
            job_id,
            JobUpdate::failed(
                retry_count,
                CANCELLED_MESSAGE.to_string(),
                state.logs.clone(),
                state.stderr.clone(),
            ),
        )
        .await;

        GenerationResult {
            success: false,
            code: state.last_code.unwrap_or_default(),
            scene_name: scene_name.to_string(),
            output_url: None,
            logs: state.logs,
            stderr: state.stderr,
            retry_count,
            error: Some(CANCELLED_MESSAGE.to_string()),
        }
    }

    /// Best-effort write; failures are logged and never abort the attempt.
    async fn persist(&self, job_id: DbId, update: JobUpdate) {
        if let Err(e) = self.store.update_job(job_id, update).await {
            tracing::warn!(job_id, error = %e, "Failed to persist job update");
        }
    }
}

/// Append one attempt's output to the running total.
fn append_output(total: &mut String, output: &str) {
    if output.trim().is_empty() {
        return;
    }
    if !total.is_empty() {
        total.push('\n');
    }
    total.push_str(output);
}

/// Await `future` unless `cancel` fires first.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output, PipelineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        output = future => Ok(output),
    }
}
