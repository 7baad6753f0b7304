//! Test helpers for building import sources and scratch stores.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}

pub(super) fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace")
}

/// Write a collection holding two identified buildings and one feature with
/// no identifier at all.
pub(super) fn write_collection(path: &Utf8Path) {
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
                "properties": {"id": "BLD002", "address": "9 Quay Road"}
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {"address": "unknown"}
            }
        ]
    });
    let bytes = serde_json::to_vec_pretty(&document).expect("encode collection");
    write_utf8(path, &bytes);
}

/// Write a plain SQLite source with a `building` table of three rows: one
/// with JSON geometry, one with only a point descriptor and one whose
/// geometry is unreadable.
pub(super) fn write_sqlite_source(path: &Utf8Path) {
    let conn = rusqlite::Connection::open(path.as_std_path()).expect("create sqlite source");
    conn.execute_batch(
        "CREATE TABLE building (
             marking_pg_id TEXT,
             geom TEXT,
             centre_point TEXT,
             height INTEGER
         );
         INSERT INTO building VALUES
             ('B1', '{\"type\":\"Point\",\"coordinates\":[121.5,31.2]}', NULL, 10),
             ('B2', NULL, 'POINT (121.4 31.1)', 12),
             ('B3', 'not geometry', NULL, 8);",
    )
    .expect("populate sqlite source");
}
