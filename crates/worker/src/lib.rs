//! Background worker that claims queued animation jobs and runs them through
//! the self-healing pipeline.

pub mod config;
pub mod runner;

pub use config::WorkerConfig;
pub use runner::JobRunner;
