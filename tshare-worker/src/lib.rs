//! # Template Share Worker Library
//!
//! Background maintenance for Template Share. Jobs implement [`jobs::Job`]
//! and are driven by the interval [`scheduler::Scheduler`].
//!
//! ## Modules
//!
//! - `config`: Worker configuration from the environment
//! - `jobs`: Maintenance jobs (stale pending-account pruning)
//! - `scheduler`: Per-job interval loops with graceful shutdown

pub mod config;
pub mod jobs;
pub mod scheduler;
