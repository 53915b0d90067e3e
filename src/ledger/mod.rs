//! Durable job ledger
//!
//! The ledger record is the only cross-run state the population jobs depend
//! on: it carries the resume position when a run is suspended by an upstream
//! rate limit.

pub mod job;
pub mod store;

pub use job::{Job, JobStatus};
pub use store::JobLedger;
