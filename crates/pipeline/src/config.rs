use framesmith_core::config::{parsed_var_or, var_or, ConfigError};

/// Default attempt ceiling for a job.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Attempt ceiling for the variant re-dispatched without voiceover.
pub const DEFAULT_DEGRADED_MAX_RETRIES: u32 = 3;

/// Attempt ceilings and render upload settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_retries: u32,
    pub degraded_max_retries: u32,
    /// Storage prefix rendered videos are uploaded under.
    pub upload_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            degraded_max_retries: DEFAULT_DEGRADED_MAX_RETRIES,
            upload_prefix: "renders".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `MAX_RETRIES`          | `5`       |
    /// | `DEGRADED_MAX_RETRIES` | `3`       |
    /// | `RENDER_UPLOAD_PREFIX` | `renders` |
    ///
    /// Ceilings below one are raised to one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_retries = parsed_var_or("MAX_RETRIES", DEFAULT_MAX_RETRIES)?.max(1);
        let degraded_max_retries =
            parsed_var_or("DEGRADED_MAX_RETRIES", DEFAULT_DEGRADED_MAX_RETRIES)?.max(1);
        let upload_prefix = var_or("RENDER_UPLOAD_PREFIX", "renders")
            .trim_matches('/')
            .to_string();

        Ok(Self {
            max_retries,
            degraded_max_retries,
            upload_prefix,
        })
    }

    /// Storage key for a job's rendered video.
    pub fn upload_target(&self, job_id: i64, scene_name: &str) -> String {
        format!("{}/{job_id}/{scene_name}.mp4", self.upload_prefix)
    }
}
