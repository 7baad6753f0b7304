//! Behavioural tests for `import_feature_collection` using rstest-bdd.

use std::cell::RefCell;

use blitzfind_core::{FeatureId, FeatureStore, test_support::MemoryStore};
use blitzfind_data::{ImportError, ImportErrorKind, ImportSummary, import_feature_collection};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

#[fixture]
fn payload() -> RefCell<Option<Vec<u8>>> {
    RefCell::new(None)
}

#[fixture]
fn store() -> RefCell<MemoryStore> {
    RefCell::new(MemoryStore::default())
}

#[fixture]
fn outcomes() -> RefCell<Vec<Result<ImportSummary, ImportError>>> {
    RefCell::new(Vec::new())
}

fn run_import(
    payload: &RefCell<Option<Vec<u8>>>,
    store: &RefCell<MemoryStore>,
    outcomes: &RefCell<Vec<Result<ImportSummary, ImportError>>>,
) {
    let bytes = payload
        .borrow()
        .clone()
        .unwrap_or_else(|| panic!("payload must be prepared"));
    let outcome = import_feature_collection(&bytes, &mut *store.borrow_mut());
    outcomes.borrow_mut().push(outcome);
}

fn summary_at(
    outcomes: &RefCell<Vec<Result<ImportSummary, ImportError>>>,
    index: usize,
) -> ImportSummary {
    match outcomes.borrow().get(index) {
        Some(Ok(summary)) => summary.clone(),
        Some(Err(err)) => panic!("expected import {index} to succeed, got {err}"),
        None => panic!("import {index} did not run"),
    }
}

#[given("a feature collection with three features, one without any identifier")]
fn three_features(payload: &RefCell<Option<Vec<u8>>>) {
    let document = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "BLD001",
                "geometry": {"type": "Point", "coordinates": [121.5, 31.2]},
                "properties": {"address": "123 Main Street"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [121.4, 31.1]},
                "properties": {"id": 42, "address": "9 Quay Road"}
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {"address": "unknown"}
            }
        ]
    });
    let bytes = serde_json::to_vec(&document).expect("encode collection");
    payload.replace(Some(bytes));
}

#[given("a payload holding a single Feature")]
fn single_feature(payload: &RefCell<Option<Vec<u8>>>) {
    let document = json!({"type": "Feature", "id": "x", "geometry": null, "properties": {}});
    payload.replace(Some(serde_json::to_vec(&document).expect("encode feature")));
}

#[when("I import the feature collection")]
fn import_once(
    payload: &RefCell<Option<Vec<u8>>>,
    store: &RefCell<MemoryStore>,
    outcomes: &RefCell<Vec<Result<ImportSummary, ImportError>>>,
) {
    run_import(payload, store, outcomes);
}

#[when("I import the feature collection again")]
fn import_twice(
    payload: &RefCell<Option<Vec<u8>>>,
    store: &RefCell<MemoryStore>,
    outcomes: &RefCell<Vec<Result<ImportSummary, ImportError>>>,
) {
    run_import(payload, store, outcomes);
}

#[then("3 features are processed")]
fn three_processed(outcomes: &RefCell<Vec<Result<ImportSummary, ImportError>>>) {
    let summary = summary_at(outcomes, 0);
    assert_eq!(summary.total_processed, 3);
    assert_eq!(summary.imported + summary.updated, 2);
    let bounds = summary.bounds.expect("geometries should produce bounds");
    assert_eq!((bounds.min().x, bounds.min().y), (121.4, 31.1));
    assert_eq!((bounds.max().x, bounds.max().y), (121.5, 31.2));
}

#[then("2 records are stored")]
fn two_stored(store: &RefCell<MemoryStore>) {
    let store = store.borrow();
    assert_eq!(store.len(), 2);
    let derived = FeatureId::new("42").expect("valid id");
    let record = store
        .get(&derived)
        .expect("memory store reads never fail")
        .expect("identifier taken from properties");
    assert_eq!(record.value.id, derived);
}

#[then("the second import updated every stored record")]
fn second_import_updates(outcomes: &RefCell<Vec<Result<ImportSummary, ImportError>>>) {
    let first = summary_at(outcomes, 0);
    let second = summary_at(outcomes, 1);
    assert_eq!((first.imported, first.updated), (2, 0));
    assert_eq!((second.imported, second.updated), (0, 2));
}

#[then("the import fails with a format error")]
fn format_error(outcomes: &RefCell<Vec<Result<ImportSummary, ImportError>>>) {
    match outcomes.borrow().last() {
        Some(Err(err)) => assert_eq!(err.kind(), ImportErrorKind::Format),
        Some(Ok(summary)) => panic!("expected a format error, got {summary:?}"),
        None => panic!("import did not run"),
    }
}

#[then("nothing is stored")]
fn nothing_stored(store: &RefCell<MemoryStore>) {
    assert!(store.borrow().is_empty());
}

#[scenario(path = "tests/features/feature_collection_import.feature", index = 0)]
fn skips_unidentified_features(
    payload: RefCell<Option<Vec<u8>>>,
    store: RefCell<MemoryStore>,
    outcomes: RefCell<Vec<Result<ImportSummary, ImportError>>>,
) {
    let _ = (payload, store, outcomes);
}

#[scenario(path = "tests/features/feature_collection_import.feature", index = 1)]
fn reimport_updates_records(
    payload: RefCell<Option<Vec<u8>>>,
    store: RefCell<MemoryStore>,
    outcomes: RefCell<Vec<Result<ImportSummary, ImportError>>>,
) {
    let _ = (payload, store, outcomes);
}

#[scenario(path = "tests/features/feature_collection_import.feature", index = 2)]
fn rejects_single_feature(
    payload: RefCell<Option<Vec<u8>>>,
    store: RefCell<MemoryStore>,
    outcomes: RefCell<Vec<Result<ImportSummary, ImportError>>>,
) {
    let _ = (payload, store, outcomes);
}
