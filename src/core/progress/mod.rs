//! Progress reporting
//!
//! [`ProgressTracker`] turns concurrently delivered batch events into a
//! monotonic stream of [`ProgressSnapshot`]s. [`BatchLoggingListener`] logs
//! every batch as it is processed.

pub mod batch_log;
pub mod clock;
pub mod snapshot;
pub mod tracker;

pub use batch_log::BatchLoggingListener;
pub use clock::{Clock, ManualClock, SystemClock};
pub use snapshot::{round_significant, ProgressSnapshot};
pub use tracker::{ProgressObserver, ProgressTracker};
