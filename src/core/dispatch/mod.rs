//! Batch dispatch
//!
//! Listener contracts, the per-job failure channel, and a local engine that
//! delivers batches to listeners on a bounded worker pool.

pub mod batcher;
pub mod failure;
pub mod listener;
pub mod report;

pub use batcher::{BatcherConfig, JobTicket, LocalBatcher};
pub use failure::{BatchFailure, BatchFailureListener, FailureChannel};
pub use listener::{BatchListener, JobContext};
pub use report::JobReport;
