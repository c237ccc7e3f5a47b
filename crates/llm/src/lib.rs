//! OpenAI-compatible text-generation client.
//!
//! Implements [`framesmith_core::text_generation::TextGenerator`] over the
//! chat completions endpoint and, for the code-execution variant, the
//! responses endpoint with a sandboxed `code_interpreter` container.

pub mod client;
pub mod config;
pub mod wire;

pub use client::OpenAiClient;
pub use config::LlmConfig;
