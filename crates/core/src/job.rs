//! Job status snapshots and the persistence seam.
//!
//! The orchestrator is the sole writer of a job's [`JobUpdate`]s. Writes go
//! through [`JobStore`], which is best-effort: a failed write is logged by the
//! caller and never aborts the attempt in progress.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Externally visible job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse from a string, returning `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further transitions happen after this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// ---------------------------------------------------------------------------
// JobUpdate
// ---------------------------------------------------------------------------

/// Partial snapshot written at a state transition. `None` fields are left
/// untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub retry_count: Option<u32>,
    pub last_error: Option<String>,
    pub code: Option<String>,
    pub logs: Option<String>,
    pub stderr: Option<String>,
    pub output_url: Option<String>,
}

impl JobUpdate {
    /// Start-of-attempt snapshot.
    pub fn processing(retry_count: u32, last_error: Option<String>) -> Self {
        Self {
            status: Some(JobStatus::Processing),
            retry_count: Some(retry_count),
            last_error,
            ..Self::default()
        }
    }

    /// Code-only snapshot written after generation.
    pub fn code(code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            ..Self::default()
        }
    }

    /// Terminal success snapshot.
    pub fn completed(
        retry_count: u32,
        output_url: Option<String>,
        logs: String,
        stderr: String,
    ) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            retry_count: Some(retry_count),
            output_url,
            logs: Some(logs),
            stderr: Some(stderr),
            ..Self::default()
        }
    }

    /// Terminal failure snapshot.
    pub fn failed(retry_count: u32, last_error: String, logs: String, stderr: String) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            retry_count: Some(retry_count),
            last_error: Some(last_error),
            logs: Some(logs),
            stderr: Some(stderr),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// Errors from a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    /// The backend could not be reached or rejected the write.
    #[error("Job store backend error: {0}")]
    Backend(String),

    /// No job row exists for the given id.
    #[error("Job {0} not found")]
    NotFound(DbId),
}

/// Generic update interface to the job-status store.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Apply a partial update to a job record.
    async fn update_job(&self, job_id: DbId, update: JobUpdate) -> Result<(), JobStoreError>;
}

/// In-process store that records every update in write order.
///
/// Useful for dry runs and as a test double for the orchestrator.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    updates: Mutex<Vec<(DbId, JobUpdate)>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates recorded so far, oldest first.
    pub fn updates(&self) -> Vec<(DbId, JobUpdate)> {
        self.updates
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Updates recorded for a single job, oldest first.
    pub fn updates_for(&self, job_id: DbId) -> Vec<JobUpdate> {
        self.updates()
            .into_iter()
            .filter(|(id, _)| *id == job_id)
            .map(|(_, update)| update)
            .collect()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn update_job(&self, job_id: DbId, update: JobUpdate) -> Result<(), JobStoreError> {
        self.updates
            .lock()
            .map_err(|e| JobStoreError::Backend(format!("memory store poisoned: {e}")))?
            .push((job_id, update));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("running"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn processing_update_carries_retry_count() {
        let update = JobUpdate::processing(2, Some("boom".to_string()));
        assert_eq!(update.status, Some(JobStatus::Processing));
        assert_eq!(update.retry_count, Some(2));
        assert_eq!(update.last_error.as_deref(), Some("boom"));
        assert!(update.code.is_none());
    }

    #[test]
    fn code_update_touches_only_code() {
        let update = JobUpdate::code("print()");
        assert!(update.status.is_none());
        assert!(update.retry_count.is_none());
        assert_eq!(update.code.as_deref(), Some("print()"));
    }

    #[tokio::test]
    async fn memory_store_preserves_write_order() {
        let store = MemoryJobStore::new();
        store.update_job(1, JobUpdate::processing(0, None)).await.unwrap();
        store.update_job(2, JobUpdate::processing(0, None)).await.unwrap();
        store.update_job(1, JobUpdate::processing(1, None)).await.unwrap();

        let retries: Vec<_> = store
            .updates_for(1)
            .into_iter()
            .map(|u| u.retry_count)
            .collect();
        assert_eq!(retries, vec![Some(0), Some(1)]);
        assert_eq!(store.updates().len(), 3);
    }
}
