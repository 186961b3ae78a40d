//! Mutation job kinds
//!
//! These kinds change the selected records in place instead of exporting
//! them. Collection lists are comma-delimited; permissions are role and
//! capability pairs.

use super::kinds::JobKind;
use super::property::JobPropertyRegistry;
use super::runner::JobState;
use crate::core::dispatch::{BatchListener, FailureChannel};
use crate::core::mutate::{Mutation, MutationListener};
use crate::domain::{DatamoveError, Permission, Result, Selection};
use std::sync::Arc;

fn parse_collections(value: &str) -> Result<Vec<String>> {
    let collections = Selection::split_list(value);
    if collections.is_empty() {
        return Err(DatamoveError::Validation(
            "at least one collection is required".to_string(),
        ));
    }
    Ok(collections)
}

fn mutation_listener<K: JobKind>(
    mutation: Mutation,
    failures: Arc<FailureChannel>,
) -> Arc<dyn BatchListener> {
    Arc::new(MutationListener::new(mutation, failures).with_name(K::NAME))
}

fn required_collections(collections: &[String]) -> Result<Vec<String>> {
    if collections.is_empty() {
        return Err(DatamoveError::Configuration(
            "collections is required".to_string(),
        ));
    }
    Ok(collections.to_vec())
}

/// Adds the selected records to collections
#[derive(Debug, Clone, Default)]
pub struct AddCollectionsJob {
    /// Collections to add
    pub collections: Vec<String>,
}

impl AddCollectionsJob {
    /// Create a kind adding `collections`
    pub fn new(collections: Vec<String>) -> Self {
        Self { collections }
    }
}

impl JobKind for AddCollectionsJob {
    const NAME: &'static str = "add-collections";

    fn description(&self, selection: &str) -> String {
        format!(
            "Adding documents {selection} to collections {:?}",
            self.collections
        )
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "collections",
            "Comma-delimited list collections to which selected records are added",
            |s, v| {
                s.kind.collections = parse_collections(v)?;
                Ok(())
            },
        );
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        let collections = required_collections(&self.collections)?;
        Ok(mutation_listener::<Self>(
            Mutation::AddCollections(collections),
            failures,
        ))
    }
}

/// Replaces the collections of the selected records
#[derive(Debug, Clone, Default)]
pub struct SetCollectionsJob {
    /// Collections each record ends up in
    pub collections: Vec<String>,
}

impl SetCollectionsJob {
    /// Create a kind setting `collections`
    pub fn new(collections: Vec<String>) -> Self {
        Self { collections }
    }
}

impl JobKind for SetCollectionsJob {
    const NAME: &'static str = "set-collections";

    fn description(&self, selection: &str) -> String {
        format!(
            "Setting collections {:?} on documents {selection}",
            self.collections
        )
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "collections",
            "Comma-delimited list collections to set on selected records",
            |s, v| {
                s.kind.collections = parse_collections(v)?;
                Ok(())
            },
        );
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        let collections = required_collections(&self.collections)?;
        Ok(mutation_listener::<Self>(
            Mutation::SetCollections(collections),
            failures,
        ))
    }
}

/// Removes the selected records from collections
///
/// Without a where property, the records in those same collections are
/// selected.
#[derive(Debug, Clone, Default)]
pub struct RemoveCollectionsJob {
    /// Collections to remove records from
    pub collections: Vec<String>,
}

impl RemoveCollectionsJob {
    /// Create a kind removing records from `collections`
    pub fn new(collections: Vec<String>) -> Self {
        Self { collections }
    }
}

impl JobKind for RemoveCollectionsJob {
    const NAME: &'static str = "remove-collections";

    fn description(&self, selection: &str) -> String {
        format!(
            "Removing documents {selection} from collections {:?}",
            self.collections
        )
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "collections",
            "Comma-delimited list of collections from which to remove selected records. \
             If no 'where' property is set, then this property also defines the list of collections to select.",
            |s, v| {
                s.kind.collections = parse_collections(v)?;
                Ok(())
            },
        );
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        let collections = required_collections(&self.collections)?;
        Ok(mutation_listener::<Self>(
            Mutation::RemoveCollections(collections),
            failures,
        ))
    }

    fn default_selection(&self) -> Option<Selection> {
        (!self.collections.is_empty()).then(|| Selection::Collections(self.collections.clone()))
    }
}

/// Deletes every record in collections
///
/// The collections are the selection; where properties do not apply.
#[derive(Debug, Clone, Default)]
pub struct DeleteCollectionsJob {
    /// Collections whose records are deleted
    pub collections: Vec<String>,
}

impl DeleteCollectionsJob {
    /// Create a kind deleting the records in `collections`
    pub fn new(collections: Vec<String>) -> Self {
        Self { collections }
    }
}

impl JobKind for DeleteCollectionsJob {
    const NAME: &'static str = "delete-collections";
    const WHERE_PROPERTIES: bool = false;

    fn description(&self, _selection: &str) -> String {
        format!("Deleting collections: {:?}", self.collections)
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "collections",
            "Comma-delimited list of collections to delete",
            |s, v| {
                s.kind.collections = parse_collections(v)?;
                Ok(())
            },
        );
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        required_collections(&self.collections)?;
        Ok(mutation_listener::<Self>(Mutation::Delete, failures))
    }

    fn default_selection(&self) -> Option<Selection> {
        (!self.collections.is_empty()).then(|| Selection::Collections(self.collections.clone()))
    }
}

/// Replaces the permissions of the selected records
#[derive(Debug, Clone, Default)]
pub struct SetPermissionsJob {
    /// Permissions each record ends up with
    pub permissions: Vec<Permission>,
}

impl SetPermissionsJob {
    /// Create a kind setting `permissions`
    pub fn new(permissions: Vec<Permission>) -> Self {
        Self { permissions }
    }
}

impl JobKind for SetPermissionsJob {
    const NAME: &'static str = "set-permissions";

    fn description(&self, selection: &str) -> String {
        let permissions: Vec<String> = self.permissions.iter().map(ToString::to_string).collect();
        format!("Setting permissions {permissions:?} on documents {selection}")
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "permissions",
            "Comma-delimited list of roles and capabilities defining permissions to set on selected records",
            |s, v| {
                s.kind.permissions = Permission::parse_list(v)?;
                Ok(())
            },
        );
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        if self.permissions.is_empty() {
            return Err(DatamoveError::Configuration(
                "permissions is required".to_string(),
            ));
        }
        Ok(mutation_listener::<Self>(
            Mutation::SetPermissions(self.permissions.clone()),
            failures,
        ))
    }
}

/// Deletes the selected records
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteJob;

impl JobKind for DeleteJob {
    const NAME: &'static str = "delete";

    fn description(&self, selection: &str) -> String {
        format!("Deleting documents {selection}")
    }

    fn register_properties(_registry: &mut JobPropertyRegistry<JobState<Self>>) {}

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        Ok(mutation_listener::<Self>(Mutation::Delete, failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collections() {
        assert_eq!(parse_collections("a, b").unwrap(), vec!["a", "b"]);
        assert!(parse_collections(" , ").is_err());
    }

    #[test]
    fn test_build_without_collections_fails() {
        let failures = Arc::new(FailureChannel::new());
        let err = AddCollectionsJob::default()
            .build_listener(failures)
            .err()
            .unwrap();
        assert!(err.to_string().contains("collections is required"));
    }

    #[test]
    fn test_remove_collections_selects_its_collections_by_default() {
        assert!(RemoveCollectionsJob::default().default_selection().is_none());
        let kind = RemoveCollectionsJob::new(vec!["stale".to_string()]);
        assert_eq!(
            kind.default_selection(),
            Some(Selection::Collections(vec!["stale".to_string()]))
        );
    }

    #[test]
    fn test_descriptions() {
        let add = AddCollectionsJob::new(vec!["a".to_string()]);
        assert_eq!(
            add.description("with URIs [\"/x\"]"),
            "Adding documents with URIs [\"/x\"] to collections [\"a\"]"
        );

        let delete = DeleteCollectionsJob::new(vec!["old".to_string()]);
        assert_eq!(delete.description("ignored"), "Deleting collections: [\"old\"]");

        let permissions = SetPermissionsJob::new(Permission::parse_list("r,read").unwrap());
        assert_eq!(
            permissions.description("in collections [\"c\"]"),
            "Setting permissions [\"r:read\"] on documents in collections [\"c\"]"
        );
    }
}
