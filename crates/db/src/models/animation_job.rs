//! Animation job entity.

use framesmith_core::error::CoreError;
use framesmith_core::generation::GenerationOptions;
use framesmith_core::job::JobStatus;
use framesmith_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `animation_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnimationJob {
    pub id: DbId,
    pub status: String,
    /// Serialized [`GenerationOptions`].
    pub options: serde_json::Value,
    /// Voiceover-free re-run of a job whose speech synthesis failed.
    pub degraded: bool,
    /// The job this degraded run was queued for.
    pub parent_job_id: Option<DbId>,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub code: Option<String>,
    pub logs: Option<String>,
    pub stderr: Option<String>,
    pub output_url: Option<String>,
    pub claimed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AnimationJob {
    /// Parsed status; `None` if the column holds an unknown value.
    pub fn job_status(&self) -> Option<JobStatus> {
        JobStatus::parse(&self.status)
    }

    /// Decode the stored generation options.
    pub fn generation_options(&self) -> Result<GenerationOptions, CoreError> {
        serde_json::from_value(self.options.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid job options: {e}")))
    }
}
