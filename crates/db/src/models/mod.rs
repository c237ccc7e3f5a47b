//! Row types for database tables.

pub mod animation_job;
