//! Remote renderer seam.
//!
//! The renderer is an opaque, possibly slow black box. It reports script
//! failures as data (`success: false`); [`RenderError`] is reserved for the
//! call itself failing. Retries are owned by the orchestrator, never by the
//! renderer client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters submitted with a script to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub code: String,
    pub scene_name: String,
    /// Storage key the rendered video should be uploaded to.
    pub upload_target: String,
    pub resolution: String,
    pub aspect_ratio: String,
    pub duration_secs: u32,
    pub style: String,
}

/// Structured renderer response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub output_url: Option<String>,
}

/// Errors raised when the render call itself fails.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Network, DNS, TLS or timeout failure.
    #[error("Render request failed: {0}")]
    Transport(String),

    /// The renderer answered with a non-2xx status.
    #[error("Renderer API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Unexpected renderer response: {0}")]
    Decode(String),
}

/// Executes a script and reports the outcome.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, RenderError>;
}
