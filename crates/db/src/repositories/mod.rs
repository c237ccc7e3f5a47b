//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod animation_job_repo;

pub use animation_job_repo::AnimationJobRepo;
