//! Filesystem-backed record store
//!
//! Records are the files under a root directory. A record's URI is `/`
//! followed by its path relative to the root; its collection is the first
//! path segment. Because collections come from the layout on disk, only
//! deletion is supported among the mutations.

use super::traits::{RecordFetcher, RecordStore, TransformRegistry};
use crate::domain::{DatamoveError, Permission, Record, Result, Selection, ServerTransform};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Record store reading files from a directory tree
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    transforms: TransformRegistry,
}

impl DirectoryStore {
    /// Open a store rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DatamoveError::Configuration(format!(
                "Record source is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root,
            transforms: TransformRegistry::new(),
        })
    }

    /// Transforms applied during fetch
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn all_uris(&self) -> Result<Vec<String>> {
        let mut uris = Vec::new();
        collect_files(&self.root, &self.root, &mut uris)?;
        uris.sort();
        Ok(uris)
    }

    fn path_for(&self, uri: &str) -> Result<PathBuf> {
        let relative = Path::new(uri.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || relative.as_os_str().is_empty() {
            return Err(DatamoveError::Fetch(format!(
                "URI does not name a file inside the store: {uri}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn collect_files(root: &Path, dir: &Path, uris: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, uris)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            uris.push(format!("/{}", segments.join("/")));
        }
    }
    Ok(())
}

fn collection_of(uri: &str) -> Option<&str> {
    let trimmed = uri.trim_start_matches('/');
    trimmed.split_once('/').map(|(first, _)| first)
}

impl RecordFetcher for DirectoryStore {
    fn fetch(&self, uris: &[String], transform: Option<&ServerTransform>) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(uris.len());
        for uri in uris {
            let path = self.path_for(uri)?;
            match fs::read(&path) {
                Ok(content) => records.push(Record::new(uri.clone(), content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(uri = %uri, "No file for URI, skipping");
                }
                Err(e) => {
                    return Err(DatamoveError::Fetch(format!(
                        "Unable to read {}: {e}",
                        path.display()
                    )));
                }
            }
        }

        match transform {
            Some(t) => self.transforms.apply(records, t),
            None => Ok(records),
        }
    }
}

impl RecordStore for DirectoryStore {
    fn select(&self, selection: &Selection) -> Result<Vec<String>> {
        selection.validate()?;
        match selection {
            Selection::Uris(uris) => Ok(uris.clone()),
            Selection::Collections(collections) => Ok(self
                .all_uris()?
                .into_iter()
                .filter(|uri| {
                    collection_of(uri)
                        .map(|c| collections.iter().any(|wanted| wanted == c))
                        .unwrap_or(false)
                })
                .collect()),
            Selection::UriPattern(pattern) => {
                let re = Selection::wildcard_regex(pattern)?;
                Ok(self
                    .all_uris()?
                    .into_iter()
                    .filter(|uri| re.is_match(uri))
                    .collect())
            }
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn add_collections(&self, _uris: &[String], _collections: &[String]) -> Result<()> {
        Err(unsupported("adding collections"))
    }

    fn set_collections(&self, _uris: &[String], _collections: &[String]) -> Result<()> {
        Err(unsupported("setting collections"))
    }

    fn remove_collections(&self, _uris: &[String], _collections: &[String]) -> Result<()> {
        Err(unsupported("removing collections"))
    }

    fn set_permissions(&self, _uris: &[String], _permissions: &[Permission]) -> Result<()> {
        Err(unsupported("setting permissions"))
    }

    fn delete(&self, uris: &[String]) -> Result<()> {
        for uri in uris {
            let path = self.path_for(uri)?;
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!(uri = %uri, "Deleted record"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(DatamoveError::Mutation(format!(
                        "Unable to delete {}: {e}",
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn unsupported(operation: &str) -> DatamoveError {
    DatamoveError::Unsupported(format!(
        "{operation} is not supported by a directory store; collections follow the directory layout"
    ))
}
