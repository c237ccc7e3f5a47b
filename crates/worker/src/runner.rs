//! Job runner.
//!
//! Polls `animation_jobs` every `poll_interval`, claims queued rows with
//! [`AnimationJobRepo::claim_next`] and runs each through the
//! [`SelfHealingPipeline`] on its own task. A semaphore caps how many jobs
//! run at once.

use std::sync::Arc;
use std::time::Duration;

use framesmith_core::error_context::is_voice_service_failure;
use framesmith_core::generation::{validate_options, GenerationOptions, GenerationResult};
use framesmith_core::job::JobUpdate;
use framesmith_db::models::animation_job::AnimationJob;
use framesmith_db::repositories::AnimationJobRepo;
use framesmith_pipeline::SelfHealingPipeline;
use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

pub struct JobRunner {
    pool: PgPool,
    pipeline: Arc<SelfHealingPipeline>,
    poll_interval: Duration,
    slots: Arc<Semaphore>,
    tasks: TaskTracker,
}

impl JobRunner {
    pub fn new(
        pool: PgPool,
        pipeline: Arc<SelfHealingPipeline>,
        poll_interval: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            pool,
            pipeline,
            poll_interval,
            slots: Arc::new(Semaphore::new(concurrency.max(1))),
            tasks: TaskTracker::new(),
        }
    }

    /// Run the polling loop until `cancel` fires, then wait for in-flight
    /// jobs to observe the cancellation and finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            concurrency = self.slots.available_permits(),
            "Job runner started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job runner shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.try_dispatch(&cancel).await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }

        self.tasks.close();
        self.tasks.wait().await;
        tracing::info!("Job runner stopped");
    }

    /// Claim jobs while there are free slots.
    async fn try_dispatch(&self, cancel: &CancellationToken) -> Result<(), sqlx::Error> {
        while let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() {
            let Some(job) = AnimationJobRepo::claim_next(&self.pool).await? else {
                break;
            };
            tracing::info!(job_id = job.id, "Job claimed");

            let pool = self.pool.clone();
            let pipeline = Arc::clone(&self.pipeline);
            let cancel = cancel.clone();
            self.tasks.spawn(async move {
                process_job(&pool, &pipeline, job, &cancel).await;
                drop(permit);
            });
        }
        Ok(())
    }
}

/// Run one claimed job to completion. When speech synthesis sank a narrated
/// job, its voiceover-free variant is queued as a separate row.
async fn process_job(
    pool: &PgPool,
    pipeline: &SelfHealingPipeline,
    job: AnimationJob,
    cancel: &CancellationToken,
) {
    let options = match decode_options(&job) {
        Ok(options) => options,
        Err(message) => {
            tracing::warn!(job_id = job.id, error = %message, "Rejecting job");
            let update = JobUpdate::failed(0, message, String::new(), String::new());
            if let Err(e) = AnimationJobRepo::apply_update(pool, job.id, &update).await {
                tracing::error!(job_id = job.id, error = %e, "Failed to mark job failed");
            }
            return;
        }
    };

    let result = if job.degraded {
        pipeline.run_without_voiceover(job.id, &options, cancel).await
    } else {
        pipeline.run(job.id, &options, cancel).await
    };

    if !job.degraded && !cancel.is_cancelled() && should_degrade(&options, &result) {
        match AnimationJobRepo::submit_degraded(pool, job.id, &options).await {
            Ok(degraded) => tracing::warn!(
                job_id = job.id,
                degraded_job_id = degraded.id,
                "Speech synthesis failed, queued a run without voiceover",
            ),
            Err(e) => {
                tracing::error!(job_id = job.id, error = %e, "Failed to queue degraded job");
            }
        }
    }

    if result.success {
        tracing::info!(
            job_id = job.id,
            retry_count = result.retry_count,
            output_url = result.output_url.as_deref().unwrap_or(""),
            "Job completed",
        );
    } else {
        tracing::warn!(
            job_id = job.id,
            retry_count = result.retry_count,
            error = result.error.as_deref().unwrap_or(""),
            "Job failed",
        );
    }
}

fn decode_options(job: &AnimationJob) -> Result<GenerationOptions, String> {
    let options = job.generation_options().map_err(|e| e.to_string())?;
    validate_options(&options).map_err(|e| e.to_string())?;
    Ok(options)
}

/// Whether a finished run should be repeated with voiceover switched off.
pub fn should_degrade(options: &GenerationOptions, result: &GenerationResult) -> bool {
    if result.success || !options.voiceover {
        return false;
    }
    let error = result.error.as_deref().unwrap_or("");
    is_voice_service_failure(error, &result.stderr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(voiceover: bool) -> GenerationOptions {
        serde_json::from_value(serde_json::json!({
            "title": "Orbits",
            "prompt": "Show two planets orbiting a star",
            "voiceover": voiceover,
            "voice": "en-US-AriaNeural"
        }))
        .unwrap()
    }

    fn failed(error: &str, stderr: &str) -> GenerationResult {
        GenerationResult {
            success: false,
            code: String::new(),
            scene_name: "OrbitsScene".to_string(),
            output_url: None,
            logs: String::new(),
            stderr: stderr.to_string(),
            retry_count: 4,
            error: Some(error.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // should_degrade
    // -----------------------------------------------------------------------

    #[test]
    fn speech_failure_on_voiceover_job_degrades() {
        let result = failed(
            "Renderer error: request to AzureService timed out",
            "",
        );
        assert!(should_degrade(&options(true), &result));
    }

    #[test]
    fn speech_failure_found_in_stderr() {
        let result = failed("exit status 1", "gTTS: 429 Too Many Requests");
        assert!(should_degrade(&options(true), &result));
    }

    #[test]
    fn job_without_voiceover_never_degrades() {
        let result = failed("AzureService failed", "");
        assert!(!should_degrade(&options(false), &result));
    }

    #[test]
    fn degraded_job_never_queues_another() {
        let result = failed("AzureService: authentication failed", "");
        assert!(!should_degrade(&options(true).without_voiceover(), &result));
    }

    #[test]
    fn scene_bug_in_narrated_block_does_not_degrade() {
        let result = failed(
            "NameError: name 'Circel' is not defined",
            "  with self.voiceover(text=\"Hello\") as tracker:\nNameError: name 'Circel' is not defined",
        );
        assert!(!should_degrade(&options(true), &result));
    }

    #[test]
    fn unrelated_failure_does_not_degrade() {
        let result = failed("NameError: name 'Circel' is not defined", "");
        assert!(!should_degrade(&options(true), &result));
    }

    #[test]
    fn success_does_not_degrade() {
        let mut result = failed("", "");
        result.success = true;
        result.error = None;
        assert!(!should_degrade(&options(true), &result));
    }
}
