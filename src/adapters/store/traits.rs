//! Record store abstraction traits
//!
//! This module defines the traits a record source must implement to feed a
//! job: resolving a [`Selection`] to URIs, fetching the records for a batch
//! of URIs, and updating or deleting the records of a batch. Calls are
//! synchronous and may block on I/O; they run on the dispatch engine's worker
//! threads.

use crate::domain::{DatamoveError, Permission, Record, Result, Selection, ServerTransform};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Retrieves record contents for a batch of URIs
pub trait RecordFetcher: Send + Sync {
    /// Fetch the records for `uris`
    ///
    /// Records are returned in `uris` order. URIs with no stored record are
    /// skipped. When `transform` is given, the named transform is applied to
    /// every record before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the transform fails.
    fn fetch(&self, uris: &[String], transform: Option<&ServerTransform>) -> Result<Vec<Record>>;
}

/// A record source that can also resolve selections and change records
///
/// Mutations apply to every URI in `uris` that names a stored record; URIs
/// with no stored record are skipped.
pub trait RecordStore: RecordFetcher {
    /// Resolve a selection to an ordered list of URIs
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is invalid or the store cannot be read.
    fn select(&self, selection: &Selection) -> Result<Vec<String>>;

    /// Short description used in logs
    fn describe(&self) -> String;

    /// Add each record to `collections`, keeping its other collections
    fn add_collections(&self, uris: &[String], collections: &[String]) -> Result<()>;

    /// Replace each record's collections with `collections`
    fn set_collections(&self, uris: &[String], collections: &[String]) -> Result<()>;

    /// Remove each record from `collections`
    fn remove_collections(&self, uris: &[String], collections: &[String]) -> Result<()>;

    /// Replace each record's permissions with `permissions`
    fn set_permissions(&self, uris: &[String], permissions: &[Permission]) -> Result<()>;

    /// Delete each record
    fn delete(&self, uris: &[String]) -> Result<()>;
}

/// Function applied to a record by a named transform
pub type TransformFn = Arc<dyn Fn(Record, &ServerTransform) -> Result<Record> + Send + Sync>;

/// Named transforms a store applies while fetching
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: Arc<RwLock<HashMap<String, TransformFn>>>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform under `name`, replacing any earlier one
    pub fn register<F>(&self, name: impl Into<String>, transform: F) -> Result<()>
    where
        F: Fn(Record, &ServerTransform) -> Result<Record> + Send + Sync + 'static,
    {
        let mut transforms = self
            .transforms
            .write()
            .map_err(|_| DatamoveError::poisoned("transform registry"))?;
        transforms.insert(name.into(), Arc::new(transform));
        Ok(())
    }

    /// Apply the named transform to each record
    ///
    /// # Errors
    ///
    /// Returns a fetch error if no transform is registered under the name, or
    /// the first error the transform returns.
    pub fn apply(&self, records: Vec<Record>, transform: &ServerTransform) -> Result<Vec<Record>> {
        let function = {
            let transforms = self
                .transforms
                .read()
                .map_err(|_| DatamoveError::poisoned("transform registry"))?;
            transforms.get(&transform.name).cloned().ok_or_else(|| {
                DatamoveError::Fetch(format!("No transform registered as '{}'", transform.name))
            })?
        };

        records
            .into_iter()
            .map(|record| function(record, transform))
            .collect()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .transforms
            .read()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("TransformRegistry")
            .field("transforms", &names)
            .finish()
    }
}
