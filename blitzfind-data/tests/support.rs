use rusqlite::{Connection, types::Value};
use std::path::Path;

/// Schema shared by the relational fixtures.
pub const BUILDING_SCHEMA: &str = "CREATE TABLE building (
    marking_pg_id TEXT,
    geom BLOB,
    centre_point TEXT,
    address TEXT,
    poi_id TEXT
)";

/// Geometry text stored for the first sample building.
pub const BLD001_GEOMETRY: &str = r#"{"type":"Polygon","coordinates":[[[121.5,31.2],[121.6,31.2],[121.6,31.3],[121.5,31.2]]]}"#;

/// Geometry text stored for the second sample building.
pub const BLD002_GEOMETRY: &str = r#"{"type":"Point","coordinates":[121.4,31.1]}"#;

/// Sample building row.
pub struct Building<'a> {
    pub id: Option<&'a str>,
    pub geometry: Value,
    pub centre_point: Option<&'a str>,
    pub address: Option<&'a str>,
}

fn open(path: &Path) -> Connection {
    Connection::open(path).unwrap_or_else(|err| {
        panic!("failed to open source database {path:?}: {err}");
    })
}

/// Create a SQLite database at `path` holding an empty `building` table.
pub fn create_source(path: &Path) {
    open(path)
        .execute_batch(BUILDING_SCHEMA)
        .unwrap_or_else(|err| panic!("failed to create building table: {err}"));
}

/// Add the spatial catalog table written by SpatiaLite-aware tools.
pub fn add_spatial_catalog(path: &Path) {
    open(path)
        .execute_batch(
            "CREATE TABLE spatial_ref_sys (srid INTEGER PRIMARY KEY, auth_name TEXT);
             INSERT INTO spatial_ref_sys VALUES (4326, 'epsg');",
        )
        .unwrap_or_else(|err| panic!("failed to create spatial catalog: {err}"));
}

/// Insert one building row.
pub fn insert_building(path: &Path, building: &Building<'_>) {
    open(path)
        .execute(
            "INSERT INTO building (marking_pg_id, geom, centre_point, address, poi_id)
             VALUES (?1, ?2, ?3, ?4, NULL)",
            (
                building.id,
                &building.geometry,
                building.centre_point,
                building.address,
            ),
        )
        .unwrap_or_else(|err| panic!("failed to insert building: {err}"));
}

/// Seed the two sample buildings with text geometry.
pub fn write_two_buildings(path: &Path) {
    create_source(path);
    insert_building(
        path,
        &Building {
            id: Some("BLD001"),
            geometry: Value::Text(BLD001_GEOMETRY.to_owned()),
            centre_point: Some("POINT Z (121.55 31.25 13.26)"),
            address: Some("123 Main Street"),
        },
    );
    insert_building(
        path,
        &Building {
            id: Some("BLD002"),
            geometry: Value::Text(BLD002_GEOMETRY.to_owned()),
            centre_point: None,
            address: Some("9 Quay Road"),
        },
    );
}
