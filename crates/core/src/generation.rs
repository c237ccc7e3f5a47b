//! Job input options and terminal job outcome.
//!
//! [`GenerationOptions`] is supplied once per job and never mutated; the
//! orchestrator only ever derives modified copies (e.g. voiceover disabled for
//! the degraded retry path). [`GenerationResult`] is constructed exactly once,
//! when the orchestrator terminates.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of the creative prompt in characters.
pub const MAX_PROMPT_LENGTH: usize = 10_000;

/// Maximum length of the human-readable title in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Longest animation a job may request, in seconds.
pub const MAX_DURATION_SECS: u32 = 600;

/// Duration used when the submitter does not specify one.
pub const DEFAULT_DURATION_SECS: u32 = 30;

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

/// Language assumed when the submitter does not choose one.
pub const DEFAULT_LANGUAGE: &str = "en";

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_resolution() -> String {
    "1080p".to_string()
}

// ---------------------------------------------------------------------------
// GenerationOptions
// ---------------------------------------------------------------------------

/// Immutable per-job input collected from the submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub title: String,
    pub prompt: String,
    #[serde(default)]
    pub voiceover: bool,
    #[serde(default)]
    pub voice: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default)]
    pub style: String,
}

impl GenerationOptions {
    /// Copy of these options with voiceover turned off.
    ///
    /// Used by the degraded job variant dispatched after a speech-synthesis
    /// failure.
    pub fn without_voiceover(&self) -> Self {
        Self {
            voiceover: false,
            ..self.clone()
        }
    }

    /// Language explicitly chosen by the submitter. The default language
    /// and blank values yield `None`, leaving the choice to the prompt.
    pub fn target_language(&self) -> Option<&str> {
        let language = self.language.trim();
        if language.is_empty() || language.eq_ignore_ascii_case(DEFAULT_LANGUAGE) {
            None
        } else {
            Some(language)
        }
    }

    /// Voice the generated script must pass to its speech service, if any.
    pub fn expected_voice(&self) -> Option<&str> {
        if self.voiceover && !self.voice.trim().is_empty() {
            Some(self.voice.as_str())
        } else {
            None
        }
    }
}

/// Validate submitter-provided options before a job is run.
pub fn validate_options(options: &GenerationOptions) -> Result<(), CoreError> {
    if options.prompt.trim().is_empty() {
        return Err(CoreError::Validation(
            "Prompt must not be empty".to_string(),
        ));
    }
    if options.prompt.len() > MAX_PROMPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Prompt exceeds maximum length of {MAX_PROMPT_LENGTH} characters (got {})",
            options.prompt.len()
        )));
    }
    if options.title.len() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters (got {})",
            options.title.len()
        )));
    }
    if options.duration_secs == 0 || options.duration_secs > MAX_DURATION_SECS {
        return Err(CoreError::Validation(format!(
            "Duration must be between 1 and {MAX_DURATION_SECS} seconds (got {})",
            options.duration_secs
        )));
    }
    if options.voiceover && options.voice.trim().is_empty() {
        return Err(CoreError::Validation(
            "A voice must be selected when voiceover is enabled".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GenerationResult
// ---------------------------------------------------------------------------

/// Terminal outcome of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub success: bool,
    pub code: String,
    pub scene_name: String,
    pub output_url: Option<String>,
    pub logs: String,
    pub stderr: String,
    /// Number of retries consumed (attempts minus one).
    pub retry_count: u32,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
