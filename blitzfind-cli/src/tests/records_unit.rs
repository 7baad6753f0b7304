//! Unit tests for the record commands.

use super::helpers::utf8_root;
use super::*;
use crate::records::{
    DEFAULT_LIMIT, DEFAULT_SKIP, DeleteArgs, ListArgs, ListConfig, QueryArgs, RecordConfig,
    SetArgs, SetConfig, execute_delete, execute_list, execute_query, execute_set,
    list_config_from_layers_for_test,
};
use blitzfind_core::{FeatureId, FeatureIdError};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Scratch {
    _tmp: TempDir,
    db: Utf8PathBuf,
}

#[fixture]
fn scratch() -> Scratch {
    let tmp = TempDir::new().expect("tempdir");
    let db = utf8_root(&tmp).join("blitzfind.db");
    Scratch { _tmp: tmp, db }
}

fn set_config(db: &Utf8Path, id: &str, body: &Value) -> SetConfig {
    SetConfig::try_from(SetArgs {
        id: Some(id.to_owned()),
        value: Some(body.to_string()),
        db: Some(db.to_path_buf()),
    })
    .expect("set config should build")
}

fn record_config(db: &Utf8Path, id: &str) -> RecordConfig {
    RecordConfig::try_from(QueryArgs {
        id: Some(id.to_owned()),
        db: Some(db.to_path_buf()),
    })
    .expect("record config should build")
}

fn building(height: i64) -> Value {
    json!({
        "type": "Feature",
        "id": "ignored",
        "geometry": {"type": "Point", "coordinates": [121.5, 31.2]},
        "properties": {"height": height}
    })
}

#[rstest]
fn record_commands_require_an_id() {
    let err = RecordConfig::try_from(DeleteArgs::default()).expect_err("missing id");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_ID);
            assert_eq!(env, ENV_DELETE_ID);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn record_commands_reject_empty_ids() {
    let err = RecordConfig::try_from(QueryArgs {
        id: Some(String::new()),
        db: None,
    })
    .expect_err("empty id");
    match err {
        CliError::InvalidId(FeatureIdError::Empty) => {}
        other => panic!("expected InvalidId, found {other:?}"),
    }
}

#[rstest]
fn set_requires_a_value() {
    let err = SetConfig::try_from(SetArgs {
        id: Some("BLD001".to_owned()),
        ..SetArgs::default()
    })
    .expect_err("missing value");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_VALUE);
            assert_eq!(env, ENV_SET_VALUE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
#[case::not_json("{not json")]
#[case::not_an_object("[1, 2]")]
#[case::wrong_type(r#"{"type": "Point", "coordinates": [1, 2]}"#)]
fn set_rejects_non_feature_values(#[case] raw: &str) {
    let err = SetConfig::try_from(SetArgs {
        id: Some("BLD001".to_owned()),
        value: Some(raw.to_owned()),
        db: None,
    })
    .expect_err("value is not a feature");
    match err {
        CliError::ParseValue { id, .. } => assert_eq!(id.as_str(), "BLD001"),
        other => panic!("expected ParseValue, found {other:?}"),
    }
}

#[rstest]
fn set_replaces_the_body_identifier(scratch: Scratch) {
    let config = set_config(&scratch.db, "BLD001", &building(50));
    assert_eq!(config.feature.id.as_str(), "BLD001");

    let summary = execute_set(config).expect("set should succeed");
    assert_eq!(summary.id.as_str(), "BLD001");
    assert_eq!(summary.created_at, summary.updated_at);

    let output = execute_query(&record_config(&scratch.db, "BLD001")).expect("query");
    assert!(output.found);
    let value = output.value.expect("stored feature");
    assert_eq!(value.id.as_str(), "BLD001");
    assert_eq!(value.properties["height"], json!(50));
}

#[rstest]
fn overwriting_keeps_creation_time(scratch: Scratch) {
    let first = execute_set(set_config(&scratch.db, "BLD001", &building(50))).expect("first");
    let second = execute_set(set_config(&scratch.db, "BLD001", &building(60))).expect("second");
    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at >= first.updated_at);
}

#[rstest]
fn query_reports_missing_records(scratch: Scratch) {
    let output = execute_query(&record_config(&scratch.db, "GHOST")).expect("query");
    assert!(!output.found);
    assert!(output.value.is_none());
    let rendered = serde_json::to_value(&output).expect("encode output");
    assert_eq!(rendered, json!({"found": false, "id": "GHOST", "value": null}));
}

#[rstest]
fn delete_removes_then_reports_absence(scratch: Scratch) {
    execute_set(set_config(&scratch.db, "BLD001", &building(50))).expect("set");
    let config = record_config(&scratch.db, "BLD001");

    let output = execute_delete(&config).expect("first delete");
    assert!(output.deleted);

    let err = execute_delete(&config).expect_err("second delete should fail");
    match err {
        CliError::RecordNotFound { id } => {
            assert_eq!(id, FeatureId::new("BLD001").expect("valid id"));
        }
        other => panic!("expected RecordNotFound, found {other:?}"),
    }
}

#[rstest]
fn list_defaults_skip_and_limit() {
    let config = ListConfig::from(ListArgs::default());
    assert_eq!(config.skip, DEFAULT_SKIP);
    assert_eq!(config.limit, DEFAULT_LIMIT);
    assert_eq!(config.db, Utf8PathBuf::from(DEFAULT_DB));
}

#[rstest]
fn list_layers_override_defaults() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_file(json!({ "limit": 10, "db": "from-file.db" }), None);
    composer.push_environment(json!({ "skip": 5 }));
    composer.push_cli(json!({ "limit": 2 }));

    let config = list_config_from_layers_for_test(composer.layers()).expect("merge layers");
    assert_eq!(config.skip, 5);
    assert_eq!(config.limit, 2);
    assert_eq!(config.db, Utf8PathBuf::from("from-file.db"));
}

#[rstest]
fn list_pages_in_identifier_order(scratch: Scratch) {
    for id in ["C", "A", "B"] {
        execute_set(set_config(&scratch.db, id, &building(10))).expect("set");
    }
    let config = ListConfig {
        skip: 1,
        limit: 1,
        db: scratch.db.clone(),
    };

    let output = execute_list(&config).expect("list");
    let rendered = serde_json::to_value(&output).expect("encode output");
    assert_eq!(rendered["total"], json!(3));
    assert_eq!(rendered["skip"], json!(1));
    assert_eq!(rendered["limit"], json!(1));
    let ids: Vec<_> = output.data.iter().map(|record| record.id.as_str()).collect();
    assert_eq!(ids, vec!["B"]);
}
