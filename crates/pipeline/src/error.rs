use framesmith_core::render::RenderError;
use framesmith_core::text_generation::TextGenerationError;

/// Errors raised inside a single pipeline attempt.
///
/// None of these abort a job on their own: the orchestrator records the
/// message as the attempt's error and moves on to the next attempt.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Code generation failed: {0}")]
    Generation(#[from] TextGenerationError),

    /// The code-execution tool response contained no program text.
    #[error("Code generation returned no program text")]
    MissingCode,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Job cancelled")]
    Cancelled,
}
