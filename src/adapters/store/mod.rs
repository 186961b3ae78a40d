//! Record stores
//!
//! The dispatch engine resolves a job's selection and fetches records through
//! these traits. [`DirectoryStore`] serves files from disk; [`InMemoryStore`]
//! serves records held in memory.

pub mod directory;
pub mod memory;
pub mod traits;

pub use directory::DirectoryStore;
pub use memory::InMemoryStore;
pub use traits::{RecordFetcher, RecordStore, TransformFn, TransformRegistry};
