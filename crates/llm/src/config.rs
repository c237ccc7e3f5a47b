use framesmith_core::config::{parsed_var_or, required_var, var_or, ConfigError};

/// Text-generation service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    /// Base URL without a trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Model used for plain completions.
    pub model: String,
    /// Model used with the code-execution tool.
    pub code_model: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                      |
    /// |--------------------|------------------------------|
    /// | `LLM_API_KEY`      | required                     |
    /// | `LLM_BASE_URL`     | `https://api.openai.com/v1`  |
    /// | `LLM_MODEL`        | `gpt-4.1`                    |
    /// | `LLM_CODE_MODEL`   | value of `LLM_MODEL`         |
    /// | `LLM_TIMEOUT_SECS` | `300`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = required_var("LLM_API_KEY")?;
        let base_url = var_or("LLM_BASE_URL", "https://api.openai.com/v1")
            .trim_end_matches('/')
            .to_string();
        let model = var_or("LLM_MODEL", "gpt-4.1");
        let code_model = var_or("LLM_CODE_MODEL", &model);
        let timeout_secs = parsed_var_or("LLM_TIMEOUT_SECS", 300u64)?;

        Ok(Self {
            api_key,
            base_url,
            model,
            code_model,
            timeout_secs,
        })
    }
}
