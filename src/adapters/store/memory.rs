//! In-memory record store

use super::traits::{RecordFetcher, RecordStore, TransformRegistry};
use crate::domain::{DatamoveError, Permission, Record, Result, Selection, ServerTransform};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: Record,
    collections: Vec<String>,
    permissions: Vec<Permission>,
}

/// Record store holding records and collection memberships in memory
///
/// # Examples
///
/// ```
/// use datamove::adapters::store::{InMemoryStore, RecordStore};
/// use datamove::domain::{Record, Selection};
///
/// let store = InMemoryStore::new();
/// store.insert(Record::new("/a.json", "{}"), &["orders"]).unwrap();
/// let uris = store.select(&Selection::Collections(vec!["orders".into()])).unwrap();
/// assert_eq!(uris, vec!["/a.json"]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, StoredRecord>>,
    transforms: TransformRegistry,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub fn insert(&self, record: Record, collections: &[&str]) -> Result<()> {
        let mut records = self.write()?;
        records.insert(
            record.uri.clone(),
            StoredRecord {
                record,
                collections: collections.iter().map(|c| c.to_string()).collect(),
                permissions: Vec::new(),
            },
        );
        Ok(())
    }

    /// Collections of a stored record
    pub fn collections_of(&self, uri: &str) -> Option<Vec<String>> {
        let records = self.records.read().ok()?;
        records.get(uri).map(|s| s.collections.clone())
    }

    /// Permissions of a stored record
    pub fn permissions_of(&self, uri: &str) -> Option<Vec<Permission>> {
        let records = self.records.read().ok()?;
        records.get(uri).map(|s| s.permissions.clone())
    }

    /// Whether a record is stored under `uri`
    pub fn contains(&self, uri: &str) -> bool {
        self.records
            .read()
            .map(|r| r.contains_key(uri))
            .unwrap_or(false)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, StoredRecord>>> {
        self.records
            .write()
            .map_err(|_| DatamoveError::poisoned("record store"))
    }

    fn update_each<F>(&self, uris: &[String], mut update: F) -> Result<()>
    where
        F: FnMut(&mut StoredRecord),
    {
        let mut records = self.write()?;
        for uri in uris {
            if let Some(stored) = records.get_mut(uri) {
                update(stored);
            }
        }
        Ok(())
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transforms applied during fetch
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }
}

impl RecordFetcher for InMemoryStore {
    fn fetch(&self, uris: &[String], transform: Option<&ServerTransform>) -> Result<Vec<Record>> {
        let records: Vec<Record> = {
            let stored = self
                .records
                .read()
                .map_err(|_| DatamoveError::poisoned("record store"))?;
            uris.iter()
                .filter_map(|uri| stored.get(uri).map(|s| s.record.clone()))
                .collect()
        };

        match transform {
            Some(t) => self.transforms.apply(records, t),
            None => Ok(records),
        }
    }
}

impl RecordStore for InMemoryStore {
    fn select(&self, selection: &Selection) -> Result<Vec<String>> {
        selection.validate()?;
        let stored = self
            .records
            .read()
            .map_err(|_| DatamoveError::poisoned("record store"))?;

        match selection {
            Selection::Uris(uris) => Ok(uris.clone()),
            Selection::Collections(collections) => Ok(stored
                .values()
                .filter(|s| s.collections.iter().any(|c| collections.contains(c)))
                .map(|s| s.record.uri.clone())
                .collect()),
            Selection::UriPattern(pattern) => {
                let re = Selection::wildcard_regex(pattern)?;
                Ok(stored.keys().filter(|uri| re.is_match(uri)).cloned().collect())
            }
        }
    }

    fn describe(&self) -> String {
        format!("in-memory store ({} records)", self.len())
    }

    fn add_collections(&self, uris: &[String], collections: &[String]) -> Result<()> {
        self.update_each(uris, |stored| {
            for collection in collections {
                if !stored.collections.contains(collection) {
                    stored.collections.push(collection.clone());
                }
            }
        })
    }

    fn set_collections(&self, uris: &[String], collections: &[String]) -> Result<()> {
        self.update_each(uris, |stored| stored.collections = collections.to_vec())
    }

    fn remove_collections(&self, uris: &[String], collections: &[String]) -> Result<()> {
        self.update_each(uris, |stored| {
            stored.collections.retain(|c| !collections.contains(c));
        })
    }

    fn set_permissions(&self, uris: &[String], permissions: &[Permission]) -> Result<()> {
        self.update_each(uris, |stored| stored.permissions = permissions.to_vec())
    }

    fn delete(&self, uris: &[String]) -> Result<()> {
        let mut records = self.write()?;
        for uri in uris {
            records.remove(uri);
        }
        Ok(())
    }
}
