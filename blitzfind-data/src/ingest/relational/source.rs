//! Row cursor over a named table of a relational source.
#![forbid(unsafe_code)]

use std::path::Path;

use rusqlite::{Connection, ErrorCode, OpenFlags, Row};

use super::row::{ColumnValue, RawRow};
use crate::ingest::ImportError;

/// Alias under which the extension-rendered geometry is selected.
pub const RENDERED_GEOMETRY_ALIAS: &str = "geometry_json";

/// Table and reserved column names of a relational source.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableLayout<'a> {
    pub table: &'a str,
    pub id_column: &'a str,
    pub geometry_column: &'a str,
}

/// Open the database at `path` read-only.
pub(crate) fn open_source(path: &Path) -> Result<Connection, ImportError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| ImportError::OpenSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Quote an identifier for interpolation into SQL.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check that the table and its reserved columns exist.
pub(crate) fn verify_layout(
    connection: &Connection,
    layout: TableLayout<'_>,
) -> Result<(), ImportError> {
    let columns = table_columns(connection, layout.table)?;
    if columns.is_empty() {
        return Err(ImportError::MissingTable {
            table: layout.table.to_owned(),
        });
    }
    for required in [layout.id_column, layout.geometry_column] {
        if !columns.iter().any(|column| column.eq_ignore_ascii_case(required)) {
            return Err(ImportError::MissingColumn {
                table: layout.table.to_owned(),
                column: required.to_owned(),
            });
        }
    }
    Ok(())
}

fn table_columns(connection: &Connection, table: &str) -> Result<Vec<String>, ImportError> {
    let mut statement = connection
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .map_err(|source| read_error("inspect table schema", source))?;
    let names = statement
        .query_map([table], |row| row.get::<_, String>(0))
        .map_err(|source| read_error("inspect table schema", source))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| read_error("inspect table schema", source))?;
    Ok(names)
}

/// Build the row query, rendering geometry when the extension is loaded.
///
/// Rows with a `NULL` identifier are excluded here so they never reach the
/// pipeline.
pub(crate) fn row_query(layout: TableLayout<'_>, render_geometry: bool) -> String {
    let table = quote_identifier(layout.table);
    let id_column = quote_identifier(layout.id_column);
    if render_geometry {
        format!(
            "SELECT AsGeoJSON({geometry}) AS {alias}, * FROM {table} WHERE {id_column} IS NOT NULL",
            geometry = quote_identifier(layout.geometry_column),
            alias = quote_identifier(RENDERED_GEOMETRY_ALIAS),
        )
    } else {
        format!("SELECT * FROM {table} WHERE {id_column} IS NOT NULL")
    }
}

/// Run `sql` and hand every row to `visit` as a [`RawRow`].
///
/// Source columns named like [`RENDERED_GEOMETRY_ALIAS`] never become
/// properties. Stops at the first error returned by `visit`.
pub(crate) fn for_each_row<F>(
    connection: &Connection,
    sql: &str,
    layout: TableLayout<'_>,
    render_geometry: bool,
    mut visit: F,
) -> Result<(), ImportError>
where
    F: FnMut(RawRow) -> Result<(), ImportError>,
{
    let mut statement = connection
        .prepare(sql)
        .map_err(|source| read_error("prepare row query", source))?;
    let names: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let mut rows = statement
        .query([])
        .map_err(|source| read_error("run row query", source))?;
    while let Some(row) = rows
        .next()
        .map_err(|source| read_error("read row", source))?
    {
        visit(split_row(row, &names, layout, render_geometry)?)?;
    }
    Ok(())
}

fn split_row(
    row: &Row<'_>,
    names: &[String],
    layout: TableLayout<'_>,
    render_geometry: bool,
) -> Result<RawRow, ImportError> {
    let mut raw = RawRow::new();
    for (index, name) in names.iter().enumerate() {
        let value = ColumnValue::from(
            row.get_ref(index)
                .map_err(|source| read_error("read column", source))?,
        );
        raw = if render_geometry && index == 0 {
            raw.with_rendered_geometry(value)
        } else if name.eq_ignore_ascii_case(layout.id_column) {
            raw.with_identifier(value)
        } else if name.eq_ignore_ascii_case(layout.geometry_column) {
            raw.with_raw_geometry(value)
        } else if name.eq_ignore_ascii_case(RENDERED_GEOMETRY_ALIAS) {
            raw
        } else {
            raw.with_column(name.as_str(), value)
        };
    }
    Ok(raw)
}

/// Map a failed read, treating a non-database payload as a format error.
pub(crate) fn read_error(operation: &'static str, source: rusqlite::Error) -> ImportError {
    if source.sqlite_error_code() == Some(ErrorCode::NotADatabase) {
        ImportError::NotADatabase { source }
    } else {
        ImportError::Query { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ImportErrorKind;
    use rstest::{fixture, rstest};

    const LAYOUT: TableLayout<'static> = TableLayout {
        table: "building",
        id_column: "marking_pg_id",
        geometry_column: "geom",
    };

    #[fixture]
    fn buildings() -> Connection {
        let conn = Connection::open_in_memory().expect("open database");
        conn.execute_batch(
            "CREATE TABLE building (marking_pg_id TEXT, geom TEXT, address TEXT, floors INTEGER);
             INSERT INTO building VALUES ('B1', '{\"type\":\"Point\",\"coordinates\":[1,2]}', 'Quay', 3);
             INSERT INTO building VALUES (NULL, NULL, 'Orphan', 1);
             INSERT INTO building VALUES ('B2', NULL, NULL, 2);",
        )
        .expect("seed buildings");
        conn
    }

    #[rstest]
    #[case("building", "\"building\"")]
    #[case("odd\"name", "\"odd\"\"name\"")]
    fn identifiers_are_quoted(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(quote_identifier(name), expected);
    }

    #[rstest]
    fn row_query_renders_geometry_first() {
        let sql = row_query(LAYOUT, true);
        assert!(sql.starts_with("SELECT AsGeoJSON(\"geom\") AS \"geometry_json\", *"));
        assert!(sql.ends_with("WHERE \"marking_pg_id\" IS NOT NULL"));
    }

    #[rstest]
    fn layout_verification_accepts_existing_columns(buildings: Connection) {
        verify_layout(&buildings, LAYOUT).expect("layout is valid");
    }

    #[rstest]
    fn missing_table_is_a_schema_error(buildings: Connection) {
        let layout = TableLayout {
            table: "parcels",
            ..LAYOUT
        };
        let error = verify_layout(&buildings, layout).expect_err("missing table");
        assert!(matches!(error, ImportError::MissingTable { ref table } if table == "parcels"));
        assert_eq!(error.kind(), ImportErrorKind::Schema);
    }

    #[rstest]
    fn missing_column_is_a_schema_error(buildings: Connection) {
        let layout = TableLayout {
            geometry_column: "shape",
            ..LAYOUT
        };
        let error = verify_layout(&buildings, layout).expect_err("missing column");
        assert!(matches!(error, ImportError::MissingColumn { ref column, .. } if column == "shape"));
    }

    #[rstest]
    fn null_identifiers_are_filtered_by_the_query(buildings: Connection) {
        let mut rows = Vec::new();
        for_each_row(&buildings, &row_query(LAYOUT, false), LAYOUT, false, |row| {
            rows.push(row);
            Ok(())
        })
        .expect("iterate rows");

        let ids: Vec<_> = rows
            .iter()
            .filter_map(RawRow::identifier)
            .map(String::from)
            .collect();
        assert_eq!(ids, vec!["B1".to_owned(), "B2".to_owned()]);
        let first = rows.first().expect("first row");
        assert!(first.raw_geometry().is_some());
        assert!(first.column("marking_pg_id").is_none());
        assert!(first.column("geom").is_none());
        assert_eq!(
            first.column("address").and_then(ColumnValue::as_text),
            Some("Quay")
        );
    }

    #[rstest]
    #[case::raw(false, "SELECT * FROM building")]
    #[case::rendered(true, "SELECT geom AS geometry_json, * FROM building")]
    fn rendered_alias_columns_are_not_properties(#[case] rendered: bool, #[case] sql: &str) {
        let conn = Connection::open_in_memory().expect("open database");
        conn.execute_batch(
            "CREATE TABLE building (marking_pg_id TEXT, geom TEXT, Geometry_JSON TEXT, address TEXT);
             INSERT INTO building VALUES ('B1', 'POINT (1 2)', 'stale', 'Quay');",
        )
        .expect("seed buildings");

        let mut rows = Vec::new();
        for_each_row(&conn, sql, LAYOUT, rendered, |row| {
            rows.push(row);
            Ok(())
        })
        .expect("iterate rows");

        let row = rows.first().expect("one row");
        assert!(row.column("geometry_json").is_none());
        assert!(row.column("Geometry_JSON").is_none());
        assert_eq!(row.rendered_geometry().is_some(), rendered);
        assert_eq!(
            row.column("address").and_then(ColumnValue::as_text),
            Some("Quay")
        );
    }
}
