//! [`JobStore`] backed by the `animation_jobs` table.

use async_trait::async_trait;
use framesmith_core::job::{JobStore, JobStoreError, JobUpdate};
use framesmith_core::types::DbId;
use sqlx::PgPool;

use crate::repositories::AnimationJobRepo;

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn update_job(&self, job_id: DbId, update: JobUpdate) -> Result<(), JobStoreError> {
        let found = AnimationJobRepo::apply_update(&self.pool, job_id, &update)
            .await
            .map_err(|e| JobStoreError::Backend(e.to_string()))?;
        if !found {
            return Err(JobStoreError::NotFound(job_id));
        }
        Ok(())
    }
}
