//! Self-healing generation pipeline.
//!
//! Prompt to specification, specification to script, static analysis,
//! conditional remediation and rendering, retried with enriched error context
//! until a render succeeds or the attempt ceiling is reached.

pub mod code_generator;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod remediator;
pub mod spec_enhancer;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::SelfHealingPipeline;
