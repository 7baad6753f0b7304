//! SQLite-backed key-value store for canonical features.

use std::{fmt, path::Path};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{Feature, FeatureId, RecordPage, RecordSummary, StoredRecord, Timestamp};

use super::{FeatureStore, StoreError};

/// Feature store persisted in a single SQLite table.
///
/// Values are stored as GeoJSON `Feature` text; timestamps as integer
/// milliseconds since the Unix epoch. Every write is its own autocommit
/// statement.
///
/// # Examples
///
/// ```
/// use blitzfind_core::{Feature, FeatureId, FeatureStore, Properties, SqliteFeatureStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteFeatureStore::open_in_memory()?;
/// let id = FeatureId::new("BLD001")?;
/// store.put(&id, Feature::new(id.clone(), None, Properties::new()))?;
/// assert!(store.get(&id)?.is_some());
/// assert!(store.delete(&id)?);
/// assert!(!store.delete(&id)?);
/// # Ok(())
/// # }
/// ```
pub struct SqliteFeatureStore {
    connection: Connection,
}

impl fmt::Debug for SqliteFeatureStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteFeatureStore")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

impl SqliteFeatureStore {
    /// Open (or create) a store in the database file at `path`.
    ///
    /// File databases are switched to write-ahead logging with relaxed
    /// synchronisation before the schema is created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tune_file_database(&connection)?;
        Self::from_connection(connection)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| StoreError::Open {
                path: ":memory:".into(),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Wrap an existing connection, creating the schema if missing.
    pub fn from_connection(connection: Connection) -> Result<Self, StoreError> {
        initialise_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Borrow the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }
}

fn tune_file_database(connection: &Connection) -> Result<(), StoreError> {
    connection
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|source| StoreError::Sqlite {
            operation: "enable write-ahead logging",
            source,
        })?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .map_err(|source| StoreError::Sqlite {
            operation: "relax synchronous mode",
            source,
        })?;
    connection
        .pragma_update(None, "temp_store", "MEMORY")
        .map_err(|source| StoreError::Sqlite {
            operation: "keep temporary tables in memory",
            source,
        })
}

fn initialise_schema(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS key_value_store (
                id TEXT PRIMARY KEY NOT NULL CHECK (length(id) > 0),
                value TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS ix_key_value_store_created_at
                ON key_value_store(created_at);
            CREATE INDEX IF NOT EXISTS ix_key_value_store_updated_at
                ON key_value_store(updated_at);",
        )
        .map_err(|source| StoreError::Sqlite {
            operation: "create key_value_store schema",
            source,
        })
}

fn to_sql_millis(timestamp: Timestamp) -> Result<i64, StoreError> {
    i64::try_from(timestamp.as_millis()).map_err(|_| StoreError::OutOfRange {
        what: "timestamp",
        value: i128::from(timestamp.as_millis()),
    })
}

fn from_sql_millis(millis: i64) -> Result<Timestamp, StoreError> {
    u64::try_from(millis)
        .map(Timestamp::from_millis)
        .map_err(|_| StoreError::OutOfRange {
            what: "timestamp",
            value: i128::from(millis),
        })
}

fn to_sql_count(value: u64, what: &'static str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange {
        what,
        value: i128::from(value),
    })
}

fn decode_feature(id: &str, text: &str) -> Result<Feature, StoreError> {
    serde_json::from_str(text).map_err(|source| StoreError::DecodeFeature {
        id: id.to_owned(),
        source,
    })
}

fn text_and_timestamps(row: &Row<'_>) -> rusqlite::Result<(String, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

impl FeatureStore for SqliteFeatureStore {
    fn get(&self, id: &FeatureId) -> Result<Option<StoredRecord>, StoreError> {
        let row: Option<(String, i64, i64)> = self
            .connection
            .query_row(
                "SELECT value, created_at, updated_at FROM key_value_store WHERE id = ?1",
                [id.as_str()],
                text_and_timestamps,
            )
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "look up record",
                source,
            })?;

        let Some((value, created_at, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(StoredRecord {
            id: id.clone(),
            value: decode_feature(id.as_str(), &value)?,
            created_at: from_sql_millis(created_at)?,
            updated_at: from_sql_millis(updated_at)?,
        }))
    }

    fn put(&mut self, id: &FeatureId, mut feature: Feature) -> Result<StoredRecord, StoreError> {
        feature.id = id.clone();
        let value = serde_json::to_string(&feature).map_err(|source| StoreError::EncodeFeature {
            id: id.clone(),
            source,
        })?;
        let now = to_sql_millis(Timestamp::now())?;

        let (created_at, updated_at): (i64, i64) = self
            .connection
            .prepare_cached(
                "INSERT INTO key_value_store (id, value, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?3)
                    ON CONFLICT(id) DO UPDATE SET
                        value = excluded.value,
                        updated_at = max(excluded.updated_at, key_value_store.updated_at)
                    RETURNING created_at, updated_at",
            )
            .and_then(|mut statement| {
                statement.query_row((id.as_str(), value, now), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
            })
            .map_err(|source| StoreError::Sqlite {
                operation: "upsert record",
                source,
            })?;

        Ok(StoredRecord {
            id: id.clone(),
            value: feature,
            created_at: from_sql_millis(created_at)?,
            updated_at: from_sql_millis(updated_at)?,
        })
    }

    fn delete(&mut self, id: &FeatureId) -> Result<bool, StoreError> {
        self.connection
            .execute("DELETE FROM key_value_store WHERE id = ?1", [id.as_str()])
            .map(|changed| changed > 0)
            .map_err(|source| StoreError::Sqlite {
                operation: "delete record",
                source,
            })
    }

    fn list(&self, skip: u64, limit: u64) -> Result<RecordPage, StoreError> {
        let total: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM key_value_store", [], |row| row.get(0))
            .map_err(|source| StoreError::Sqlite {
                operation: "count records",
                source,
            })?;
        let total = u64::try_from(total).map_err(|_| StoreError::OutOfRange {
            what: "record count",
            value: i128::from(total),
        })?;

        let mut statement = self
            .connection
            .prepare_cached(
                "SELECT id, created_at, updated_at FROM key_value_store
                    ORDER BY id LIMIT ?1 OFFSET ?2",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare record listing",
                source,
            })?;
        let rows = statement
            .query_map(
                (to_sql_count(limit, "limit")?, to_sql_count(skip, "skip")?),
                text_and_timestamps,
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "list records",
                source,
            })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, created_at, updated_at) = row.map_err(|source| StoreError::Sqlite {
                operation: "read listed record",
                source,
            })?;
            let id = FeatureId::new(id).map_err(|_| StoreError::EmptyIdentifier)?;
            records.push(RecordSummary {
                id,
                created_at: from_sql_millis(created_at)?,
                updated_at: from_sql_millis(updated_at)?,
            });
        }

        Ok(RecordPage {
            total,
            skip,
            limit,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Geometry, Properties};
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    fn id(value: &str) -> FeatureId {
        FeatureId::new(value).expect("valid id")
    }

    fn feature(value: &str, height: f64) -> Feature {
        let mut properties = Properties::new();
        properties.insert("dsm_max".into(), json!(height));
        Feature::new(id(value), Geometry::point(121.5, 31.2, None), properties)
    }

    #[fixture]
    fn store() -> SqliteFeatureStore {
        SqliteFeatureStore::open_in_memory().expect("open in-memory store")
    }

    #[rstest]
    fn put_creates_record_with_matching_timestamps(mut store: SqliteFeatureStore) {
        let record = store.put(&id("BLD001"), feature("BLD001", 50.0)).expect("put");
        assert_eq!(record.created_at, record.updated_at);

        let fetched = store.get(&id("BLD001")).expect("get").expect("present");
        assert_eq!(fetched, record);
    }

    #[rstest]
    fn put_overwrites_value_and_keeps_created_at(mut store: SqliteFeatureStore) {
        let first = store.put(&id("BLD001"), feature("BLD001", 50.0)).expect("put");
        let second = store.put(&id("BLD001"), feature("BLD001", 60.0)).expect("put");

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        let fetched = store.get(&id("BLD001")).expect("get").expect("present");
        assert_eq!(fetched.value.properties["dsm_max"], json!(60.0));
    }

    #[rstest]
    fn put_keys_value_by_store_identifier(mut store: SqliteFeatureStore) {
        let record = store.put(&id("outer"), feature("inner", 1.0)).expect("put");
        assert_eq!(record.value.id, id("outer"));
        assert!(store.get(&id("inner")).expect("get").is_none());
    }

    #[rstest]
    fn get_missing_returns_none(store: SqliteFeatureStore) {
        assert!(store.get(&id("missing")).expect("get").is_none());
    }

    #[rstest]
    fn get_reports_corrupt_values(store: SqliteFeatureStore) {
        store
            .connection()
            .execute(
                "INSERT INTO key_value_store (id, value, created_at, updated_at)
                    VALUES ('bad', 'not-json', 0, 0)",
                [],
            )
            .expect("insert corrupt row");

        let error = store.get(&id("bad")).expect_err("corrupt value should fail");
        assert!(matches!(error, StoreError::DecodeFeature { id, .. } if id == "bad"));
    }

    #[rstest]
    fn list_paginates_in_identifier_order(mut store: SqliteFeatureStore) {
        for key in ["c", "a", "b"] {
            store.put(&id(key), feature(key, 1.0)).expect("put");
        }

        let page = store.list(1, 1).expect("list");
        assert_eq!(page.total, 3);
        assert_eq!(page.skip, 1);
        assert_eq!(page.limit, 1);
        let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[rstest]
    fn list_rejects_limits_beyond_sqlite_range(store: SqliteFeatureStore) {
        let error = store.list(0, u64::MAX).expect_err("limit overflows i64");
        assert!(matches!(error, StoreError::OutOfRange { what: "limit", .. }));
    }

    #[rstest]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("blitzfind.db");
        {
            let mut store = SqliteFeatureStore::open(&path).expect("open file store");
            store.put(&id("BLD001"), feature("BLD001", 1.0)).expect("put");
        }

        let store = SqliteFeatureStore::open(&path).expect("reopen file store");
        assert!(store.get(&id("BLD001")).expect("get").is_some());
        let mode: String = store
            .connection()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("read journal mode");
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
