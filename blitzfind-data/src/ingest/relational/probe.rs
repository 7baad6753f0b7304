//! Detection of spatial-extension metadata in a relational source.
#![forbid(unsafe_code)]

use log::debug;
use rusqlite::{Connection, OptionalExtension};

/// Catalog table created by spatial-extension-aware writers.
pub const SPATIAL_CATALOG_TABLE: &str = "spatial_ref_sys";

/// Outcome of probing a source for spatial capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capability {
    /// Whether the source carries the spatial catalog table.
    pub supported: bool,
}

/// Check whether the source was written by a spatial-extension-aware tool.
///
/// Looks for [`SPATIAL_CATALOG_TABLE`] in `sqlite_master`. A missing table and
/// a failing query both report no capability.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use blitzfind_data::ingest::probe_spatial_capability;
///
/// let conn = Connection::open_in_memory().expect("open database");
/// assert!(!probe_spatial_capability(&conn).supported);
/// conn.execute("CREATE TABLE spatial_ref_sys (srid INTEGER PRIMARY KEY)", [])
///     .expect("create catalog");
/// assert!(probe_spatial_capability(&conn).supported);
/// ```
#[must_use]
pub fn probe_spatial_capability(connection: &Connection) -> Capability {
    let found = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
            [SPATIAL_CATALOG_TABLE],
            |_| Ok(()),
        )
        .optional();

    match found {
        Ok(presence) => Capability {
            supported: presence.is_some(),
        },
        Err(err) => {
            debug!("spatial capability probe failed, treating source as non-spatial: {err}");
            Capability::default()
        }
    }
}
