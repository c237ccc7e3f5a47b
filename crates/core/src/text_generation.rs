//! Text-generation service seam.
//!
//! Components never hold a process-global client; an `Arc<dyn TextGenerator>`
//! is constructed once and passed into each entry point.

use async_trait::async_trait;

/// One piece of a code-execution tool response, in response order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSegment {
    /// Inline assistant text.
    Text(String),
    /// Source submitted to the sandboxed code-execution capability.
    CodeExecution { code: String },
}

impl ToolSegment {
    /// Program text carried by this segment, if it carries any.
    pub fn program_text(&self) -> Option<&str> {
        let text = match self {
            ToolSegment::Text(text) => text.as_str(),
            ToolSegment::CodeExecution { code } => code.as_str(),
        };
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Return the first segment that carries program text.
pub fn first_program_text(segments: &[ToolSegment]) -> Option<&str> {
    segments.iter().find_map(ToolSegment::program_text)
}

/// Errors from the text-generation service.
#[derive(Debug, thiserror::Error)]
pub enum TextGenerationError {
    /// The request could not be sent or the connection dropped.
    #[error("Text generation request failed: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("Text generation API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected text generation response: {0}")]
    Decode(String),

    /// The service answered successfully but produced no text.
    #[error("Text generation returned an empty response")]
    EmptyResponse,
}

/// Opaque prompt-in, text-out service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Plain completion. The text may be wrapped in markdown code fences.
    async fn complete(&self, system: &str, user: &str) -> Result<String, TextGenerationError>;

    /// Completion that must invoke the sandboxed code-execution tool.
    async fn complete_with_code_tool(
        &self,
        system: &str,
        user: &str,
    ) -> Result<Vec<ToolSegment>, TextGenerationError>;
}
