//! External system integrations for Datamove.
//!
//! - [`store`] - Record sources a job reads from (trait-based)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate the record source from
//! the export pipeline and enable testing with in-memory implementations.
//!
//! ```rust,no_run
//! use datamove::adapters::store::{DirectoryStore, RecordStore};
//! use datamove::domain::Selection;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = DirectoryStore::open("/data/records")?;
//! let uris = store.select(&Selection::UriPattern("/orders/*.json".to_string()))?;
//! println!("Selected {} records", uris.len());
//! # Ok(())
//! # }
//! ```

pub mod store;
