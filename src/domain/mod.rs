//! Domain models and types for Datamove.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Batch events** ([`BatchEvent`]) delivered by the dispatch engine
//! - **Records** ([`Record`], [`RecordFormat`]) retrieved for a batch
//! - **Selections** ([`Selection`]) and **transforms** ([`ServerTransform`]) handed to the record store
//! - **Permissions** ([`Permission`], [`Capability`]) set by permission jobs
//! - **Error types** ([`DatamoveError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, DatamoveError>`]:
//!
//! ```rust
//! use datamove::domain::{DatamoveError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(DatamoveError::Validation("batchSize must be > 0".to_string()))
//! }
//! ```

pub mod batch;
pub mod errors;
pub mod permission;
pub mod record;
pub mod result;
pub mod selection;
pub mod transform;

pub use batch::BatchEvent;
pub use errors::DatamoveError;
pub use permission::{Capability, Permission};
pub use record::{Record, RecordFormat};
pub use result::Result;
pub use selection::Selection;
pub use transform::ServerTransform;
