//! Domain logic for the self-healing animation pipeline.
//!
//! Pure types and functions: generation options, the technical
//! specification model, static analysis of generated scripts, render failure
//! classification, and the collaborator traits the pipeline is built on.
//! Nothing in this crate performs network or database I/O; [`config`] only
//! reads environment variables.

pub mod code_cleanup;
pub mod config;
pub mod error;
pub mod error_context;
pub mod generation;
pub mod job;
pub mod naming;
pub mod render;
pub mod render_params;
pub mod spec;
pub mod spec_fallback;
pub mod static_analysis;
pub mod text_generation;
pub mod types;
