//! Integration tests for jobs that change records in place
//!
//! These tests verify that:
//! - Collection and permission jobs update every selected record
//! - Delete jobs remove records from memory and from disk
//! - A store that cannot apply a mutation fails each batch once
//! - Simple export hands every record to the supplied consumers

use datamove::adapters::store::{DirectoryStore, InMemoryStore};
use datamove::core::job::{job_for_name, Job, SimpleExportJob};
use datamove::domain::{Capability, Permission, Record};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn tagged_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    for i in 1..=5 {
        store
            .insert(Record::new(format!("/orders/{i}.json"), "{}"), &["orders"])
            .unwrap();
    }
    store
        .insert(Record::new("/stale/1.json", "{}"), &["stale", "orders"])
        .unwrap();
    store
        .insert(Record::new("/stale/2.json", "{}"), &["stale"])
        .unwrap();
    Arc::new(store)
}

async fn run_named(
    name: &str,
    store: Arc<InMemoryStore>,
    pairs: &[(&str, &str)],
) -> datamove::core::dispatch::JobReport {
    let mut job = job_for_name(name).unwrap();
    let errors = job.configure(&values(pairs));
    assert!(errors.is_empty(), "{errors:?}");
    job.start(store).unwrap().await_completion().await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_collections_to_selected_records() {
    let store = tagged_store();
    let report = run_named(
        "add-collections",
        store.clone(),
        &[
            ("whereUriPattern", "/orders/*"),
            ("collections", "archived, 2024"),
            ("batchSize", "2"),
            ("threadCount", "3"),
        ],
    )
    .await;

    assert!(report.is_successful());
    assert_eq!(report.batches_total, 3);
    for i in 1..=5 {
        assert_eq!(
            store.collections_of(&format!("/orders/{i}.json")).unwrap(),
            vec!["orders", "archived", "2024"]
        );
    }
    assert_eq!(store.collections_of("/stale/2.json").unwrap(), vec!["stale"]);
}

#[tokio::test]
async fn test_set_collections_replaces_membership() {
    let store = tagged_store();
    run_named(
        "set-collections",
        store.clone(),
        &[("whereUris", "/stale/1.json"), ("collections", "fresh")],
    )
    .await;
    assert_eq!(store.collections_of("/stale/1.json").unwrap(), vec!["fresh"]);
}

#[tokio::test]
async fn test_remove_collections_defaults_to_its_collections() {
    let store = tagged_store();
    let report = run_named("remove-collections", store.clone(), &[("collections", "stale")]).await;

    assert_eq!(report.total_results, 2);
    assert_eq!(store.collections_of("/stale/1.json").unwrap(), vec!["orders"]);
    assert!(store.collections_of("/stale/2.json").unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_collections_removes_records() {
    let store = tagged_store();
    let report = run_named(
        "delete-collections",
        store.clone(),
        &[("collections", "stale"), ("batchSize", "1")],
    )
    .await;

    assert_eq!(report.batches_total, 2);
    assert!(!store.contains("/stale/1.json"));
    assert!(!store.contains("/stale/2.json"));
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn test_set_permissions_on_selection() {
    let store = tagged_store();
    run_named(
        "set-permissions",
        store.clone(),
        &[
            ("whereCollections", "stale"),
            ("permissions", "reader,read,writer,update"),
        ],
    )
    .await;

    assert_eq!(
        store.permissions_of("/stale/2.json").unwrap(),
        vec![
            Permission::new("reader", Capability::Read),
            Permission::new("writer", Capability::Update),
        ]
    );
    assert!(store.permissions_of("/orders/1.json").unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_requires_selection() {
    let mut job = job_for_name("delete").unwrap();
    assert!(job.configure(&HashMap::new()).is_empty());
    let err = job.start(tagged_store()).err().unwrap();
    assert!(err.to_string().contains("selection is required"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_files_from_directory_store() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("tmp")).unwrap();
    fs::create_dir_all(dir.path().join("keep")).unwrap();
    for i in 0..4 {
        fs::write(dir.path().join(format!("tmp/{i}.json")), "{}").unwrap();
    }
    fs::write(dir.path().join("keep/a.json"), "{}").unwrap();

    let mut job = job_for_name("delete").unwrap();
    let errors = job.configure(&values(&[("whereCollections", "tmp"), ("batchSize", "3")]));
    assert!(errors.is_empty(), "{errors:?}");
    let store = Arc::new(DirectoryStore::open(dir.path()).unwrap());
    let report = job.start(store).unwrap().await_completion().await.unwrap();

    assert!(report.is_successful());
    assert_eq!(fs::read_dir(dir.path().join("tmp")).unwrap().count(), 0);
    assert!(dir.path().join("keep/a.json").exists());
}

#[tokio::test]
async fn test_unsupported_mutation_fails_each_batch() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("orders")).unwrap();
    for i in 0..3 {
        fs::write(dir.path().join(format!("orders/{i}.json")), "{}").unwrap();
    }

    let mut job = job_for_name("add-collections").unwrap();
    let errors = job.configure(&values(&[
        ("whereCollections", "orders"),
        ("collections", "archived"),
        ("batchSize", "1"),
    ]));
    assert!(errors.is_empty(), "{errors:?}");
    let store = Arc::new(DirectoryStore::open(dir.path()).unwrap());
    let report = job.start(store).unwrap().await_completion().await.unwrap();

    assert_eq!(report.batches_failed, 3);
    assert_eq!(report.failures.len(), 3);
    assert!(report.failures[0].message.contains("not supported"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_simple_export_feeds_consumers() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut job = Job::new(SimpleExportJob::new(move |record| {
        sink.lock().unwrap().push(record.uri.clone());
        Ok(())
    }));
    let errors = job.configure(&values(&[
        ("whereCollections", "orders"),
        ("batchSize", "2"),
    ]));
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(job.description(), "Exporting documents in collections [\"orders\"]");

    let report = job.run(tagged_store()).await.unwrap();
    assert!(report.is_successful());

    let mut uris = seen.lock().unwrap().clone();
    uris.sort();
    assert_eq!(uris.len(), 6);
    assert_eq!(uris[0], "/orders/1.json");
    assert_eq!(uris[5], "/stale/1.json");
}
