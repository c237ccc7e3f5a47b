//! Repository for the `animation_jobs` table.

use framesmith_core::generation::GenerationOptions;
use framesmith_core::job::{JobStatus, JobUpdate};
use framesmith_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::animation_job::AnimationJob;

/// Column list for `animation_jobs` queries.
const COLUMNS: &str = "\
    id, status, options, degraded, parent_job_id, retry_count, last_error, code, \
    logs, stderr, output_url, claimed_at, completed_at, created_at, updated_at";

pub struct AnimationJobRepo;

impl AnimationJobRepo {
    /// Queue a new job.
    pub async fn submit(
        pool: &PgPool,
        options: &GenerationOptions,
    ) -> Result<AnimationJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO animation_jobs (status, options) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnimationJob>(&query)
            .bind(JobStatus::Queued.as_str())
            .bind(Json(options))
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest queued job and mark it processing.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never claim
    /// the same row.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<AnimationJob>, sqlx::Error> {
        let query = format!(
            "UPDATE animation_jobs \
             SET status = $1, claimed_at = NOW(), updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM animation_jobs \
                 WHERE status = $2 \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnimationJob>(&query)
            .bind(JobStatus::Processing.as_str())
            .bind(JobStatus::Queued.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Apply a partial update. `None` fields keep their stored value.
    /// Terminal statuses also stamp `completed_at`.
    ///
    /// Returns `false` if no row matched `job_id`.
    pub async fn apply_update(
        pool: &PgPool,
        job_id: DbId,
        update: &JobUpdate,
    ) -> Result<bool, sqlx::Error> {
        let status = update.status.map(|s| s.as_str());
        let terminal = update.status.is_some_and(|s| s.is_terminal());
        let retry_count = update
            .retry_count
            .map(|c| i32::try_from(c).unwrap_or(i32::MAX));

        let result = sqlx::query(
            "UPDATE animation_jobs SET \
                 status = COALESCE($2, status), \
                 retry_count = COALESCE($3, retry_count), \
                 last_error = COALESCE($4, last_error), \
                 code = COALESCE($5, code), \
                 logs = COALESCE($6, logs), \
                 stderr = COALESCE($7, stderr), \
                 output_url = COALESCE($8, output_url), \
                 completed_at = CASE WHEN $9 THEN NOW() ELSE completed_at END, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(status)
        .bind(retry_count)
        .bind(update.last_error.as_deref())
        .bind(update.code.as_deref())
        .bind(update.logs.as_deref())
        .bind(update.stderr.as_deref())
        .bind(update.output_url.as_deref())
        .bind(terminal)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Queue the voiceover-free variant of a failed job as a new row.
    ///
    /// The parent keeps its terminal status and retry count; the new row
    /// starts its own attempt sequence at zero.
    pub async fn submit_degraded(
        pool: &PgPool,
        parent_job_id: DbId,
        options: &GenerationOptions,
    ) -> Result<AnimationJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO animation_jobs (status, options, degraded, parent_job_id) \
             VALUES ($1, $2, TRUE, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnimationJob>(&query)
            .bind(JobStatus::Queued.as_str())
            .bind(Json(options.without_voiceover()))
            .bind(parent_job_id)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Option<AnimationJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM animation_jobs WHERE id = $1");
        sqlx::query_as::<_, AnimationJob>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }
}
