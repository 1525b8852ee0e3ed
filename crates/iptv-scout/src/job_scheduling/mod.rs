//! Job entry points and the cron scheduler that drives them
//!
//! [`JobRunner`] exposes one standalone entry point per pipeline. Each opens
//! the store, runs, and closes it again. [`JobScheduler`] fires those entry
//! points from cron expressions, strictly one job at a time.

pub mod runner;
pub mod scheduler;

pub use runner::{JobKind, JobRunner};
pub use scheduler::JobScheduler;
