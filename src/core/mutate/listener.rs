//! Mutation listener
//!
//! Applies one [`Mutation`] to the URIs of each batch. A failing or panicking
//! mutation fails its batch: the failure is reported once on the job's
//! failure channel and the other batches keep going.

use crate::adapters::store::RecordStore;
use crate::core::dispatch::listener::panic_message;
use crate::core::dispatch::{BatchListener, FailureChannel};
use crate::domain::{BatchEvent, DatamoveError, Permission, Result};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A change applied to every record of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Add records to collections
    AddCollections(Vec<String>),
    /// Replace the collections of records
    SetCollections(Vec<String>),
    /// Remove records from collections
    RemoveCollections(Vec<String>),
    /// Replace the permissions of records
    SetPermissions(Vec<Permission>),
    /// Delete records
    Delete,
}

impl Mutation {
    /// Apply the mutation to `uris`
    pub fn apply(&self, store: &dyn RecordStore, uris: &[String]) -> Result<()> {
        match self {
            Mutation::AddCollections(collections) => store.add_collections(uris, collections),
            Mutation::SetCollections(collections) => store.set_collections(uris, collections),
            Mutation::RemoveCollections(collections) => {
                store.remove_collections(uris, collections)
            }
            Mutation::SetPermissions(permissions) => store.set_permissions(uris, permissions),
            Mutation::Delete => store.delete(uris),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::AddCollections(c) => write!(f, "add collections {c:?}"),
            Mutation::SetCollections(c) => write!(f, "set collections {c:?}"),
            Mutation::RemoveCollections(c) => write!(f, "remove collections {c:?}"),
            Mutation::SetPermissions(p) => {
                let p: Vec<String> = p.iter().map(ToString::to_string).collect();
                write!(f, "set permissions {p:?}")
            }
            Mutation::Delete => f.write_str("delete"),
        }
    }
}

/// Listener applying a mutation to each batch
pub struct MutationListener {
    name: String,
    mutation: Mutation,
    failures: Arc<FailureChannel>,
}

impl MutationListener {
    /// Create a listener reporting failures on `failures`
    pub fn new(mutation: Mutation, failures: Arc<FailureChannel>) -> Self {
        Self {
            name: "mutation".to_string(),
            mutation,
            failures,
        }
    }

    /// Name used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The applied mutation
    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }
}

impl BatchListener for MutationListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_batch(&self, batch: &BatchEvent, records: &dyn RecordStore) -> Result<()> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.mutation.apply(records, &batch.items)
        }));
        let error = match outcome {
            Ok(Ok(())) => {
                tracing::debug!(
                    listener = %self.name,
                    batch_number = batch.job_batch_number,
                    items = batch.len(),
                    "Applied {}",
                    self.mutation
                );
                return Ok(());
            }
            Ok(Err(e)) => e,
            Err(payload) => DatamoveError::Mutation(format!(
                "{} on batch {} failed with {}",
                self.mutation,
                batch.job_batch_number,
                panic_message(payload)
            )),
        };

        tracing::warn!(
            listener = %self.name,
            batch_number = batch.job_batch_number,
            items = batch.len(),
            error = %error,
            "Unable to {} on batch",
            self.mutation
        );
        self.failures.notify(batch, &error);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::{InMemoryStore, RecordFetcher};
    use crate::domain::{Record, Selection, ServerTransform};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        for uri in ["/r/1.json", "/r/2.json"] {
            store.insert(Record::new(uri, "{}"), &["r"]).unwrap();
        }
        store
    }

    #[test]
    fn test_applies_mutation_to_batch_uris() {
        let store = store();
        let failures = Arc::new(FailureChannel::new());
        let listener = MutationListener::new(
            Mutation::AddCollections(vec!["done".to_string()]),
            failures.clone(),
        );

        let batch = BatchEvent::new(vec!["/r/1.json".into()], 1, 1);
        listener.process_batch(&batch, &store).unwrap();

        assert_eq!(store.collections_of("/r/1.json").unwrap(), vec!["r", "done"]);
        assert_eq!(store.collections_of("/r/2.json").unwrap(), vec!["r"]);
        assert!(failures.failures().is_empty());
    }

    struct BrokenStore {
        inner: InMemoryStore,
    }

    impl RecordFetcher for BrokenStore {
        fn fetch(&self, uris: &[String], t: Option<&ServerTransform>) -> Result<Vec<Record>> {
            self.inner.fetch(uris, t)
        }
    }

    impl RecordStore for BrokenStore {
        fn select(&self, selection: &Selection) -> Result<Vec<String>> {
            self.inner.select(selection)
        }
        fn describe(&self) -> String {
            "broken".to_string()
        }
        fn add_collections(&self, _u: &[String], _c: &[String]) -> Result<()> {
            Err(DatamoveError::Mutation("store is read-only".to_string()))
        }
        fn set_collections(&self, _u: &[String], _c: &[String]) -> Result<()> {
            Ok(())
        }
        fn remove_collections(&self, _u: &[String], _c: &[String]) -> Result<()> {
            Ok(())
        }
        fn set_permissions(&self, _u: &[String], _p: &[Permission]) -> Result<()> {
            Ok(())
        }
        fn delete(&self, _uris: &[String]) -> Result<()> {
            panic!("delete exploded")
        }
    }

    #[test]
    fn test_error_and_panic_reported_once_per_batch() {
        let store = BrokenStore { inner: store() };
        let failures = Arc::new(FailureChannel::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        failures.on_failure(move |_batch, _error| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let add = MutationListener::new(
            Mutation::AddCollections(vec!["x".to_string()]),
            failures.clone(),
        );
        let delete = MutationListener::new(Mutation::Delete, failures.clone()).with_name("delete");

        assert!(add
            .process_batch(&BatchEvent::new(vec!["/r/1.json".into()], 1, 1), &store)
            .is_ok());
        assert!(delete
            .process_batch(&BatchEvent::new(vec!["/r/2.json".into()], 2, 2), &store)
            .is_ok());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let recorded = failures.failures();
        assert!(recorded[0].message.contains("read-only"));
        assert_eq!(recorded[1].batch_number, 2);
        assert!(recorded[1].message.contains("delete exploded"));
    }

    #[test]
    fn test_display() {
        let permissions = Permission::parse_list("reader,read").unwrap();
        assert_eq!(
            Mutation::SetPermissions(permissions).to_string(),
            "set permissions [\"reader:read\"]"
        );
        assert_eq!(Mutation::Delete.to_string(), "delete");
    }
}
