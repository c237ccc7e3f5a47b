use framesmith_core::config::{parsed_var_or, required_var, ConfigError};

/// Renderer connection settings.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Base HTTP URL, e.g. `http://renderer:8000`.
    pub url: String,
    /// Renders can take minutes; this bounds a single call.
    pub timeout_secs: u64,
}

impl RendererConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default  |
    /// |-------------------------|----------|
    /// | `RENDERER_URL`          | required |
    /// | `RENDERER_TIMEOUT_SECS` | `900`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = required_var("RENDERER_URL")?
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = parsed_var_or("RENDERER_TIMEOUT_SECS", 900u64)?;

        Ok(Self { url, timeout_secs })
    }
}
