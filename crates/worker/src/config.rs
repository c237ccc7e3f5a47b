use std::time::Duration;

use framesmith_core::config::{parsed_var_or, required_var, ConfigError};

/// Worker process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub poll_interval_secs: u64,
    /// Maximum number of jobs running at once.
    pub concurrency: usize,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default  |
    /// |----------------------|----------|
    /// | `DATABASE_URL`       | required |
    /// | `POLL_INTERVAL_SECS` | `2`      |
    /// | `WORKER_CONCURRENCY` | `2`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required_var("DATABASE_URL")?;
        let poll_interval_secs = parsed_var_or("POLL_INTERVAL_SECS", 2u64)?.max(1);
        let concurrency = parsed_var_or("WORKER_CONCURRENCY", 2usize)?.max(1);

        Ok(Self {
            database_url,
            poll_interval_secs,
            concurrency,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
