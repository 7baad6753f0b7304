//! Persistence seam for canonical features.
//!
//! The [`FeatureStore`] trait is the key-value contract the import pipeline
//! writes through. Each call is an independent single-record operation: there
//! is no transaction spanning several calls, so a caller that stops half way
//! leaves the earlier writes in place.

use thiserror::Error;

use crate::{Feature, FeatureId, RecordPage, StoredRecord};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteFeatureStore;

/// Key-value access to stored features.
///
/// # Examples
///
/// ```rust
/// use blitzfind_core::{Feature, FeatureId, FeatureStore, Properties};
/// use blitzfind_core::test_support::MemoryStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = MemoryStore::default();
/// let id = FeatureId::new("BLD001")?;
/// store.put(&id, Feature::new(id.clone(), None, Properties::new()))?;
///
/// let record = store.get(&id)?.expect("record was written");
/// assert_eq!(record.created_at, record.updated_at);
/// assert_eq!(store.list(0, 10)?.total, 1);
/// # Ok(())
/// # }
/// ```
pub trait FeatureStore {
    /// Fetch the record stored under `id`, if any.
    fn get(&self, id: &FeatureId) -> Result<Option<StoredRecord>, StoreError>;

    /// Create or overwrite the record stored under `id`.
    ///
    /// A new record gets `created_at == updated_at == now`. An existing
    /// record keeps its `created_at` and has `updated_at` refreshed. The
    /// stored feature always carries `id`, whatever identifier `feature`
    /// arrived with.
    fn put(&mut self, id: &FeatureId, feature: Feature) -> Result<StoredRecord, StoreError>;

    /// Remove the record stored under `id`, reporting whether one existed.
    fn delete(&mut self, id: &FeatureId) -> Result<bool, StoreError>;

    /// List identifiers and timestamps, ordered by identifier.
    fn list(&self, skip: u64, limit: u64) -> Result<RecordPage, StoreError>;
}

/// Errors raised by [`FeatureStore`] implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Opening the backing database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open feature store at {path:?}")]
    Open {
        /// Location of the database on disk.
        path: std::path::PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A SQLite statement failed.
    #[cfg(feature = "store-sqlite")]
    #[error("feature store failed to {operation}")]
    Sqlite {
        /// Short description of the failing step.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Serialising a feature to JSON failed.
    #[error("failed to encode feature {id}")]
    EncodeFeature {
        /// Identifier of the record being written.
        id: FeatureId,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored value could not be decoded as a feature.
    #[error("stored value for {id} is not a valid feature")]
    DecodeFeature {
        /// Identifier of the corrupt record.
        id: String,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored row carries an empty identifier.
    #[error("stored record has an empty identifier")]
    EmptyIdentifier,
    /// A timestamp or count does not fit the backend's integer range.
    #[error("{what} value {value} is outside the supported range")]
    OutOfRange {
        /// Which value overflowed.
        what: &'static str,
        /// Offending value, widened for display.
        value: i128,
    },
    /// The backend refused the write.
    #[error("store rejected write for {id}: {reason}")]
    Rejected {
        /// Identifier of the refused record.
        id: FeatureId,
        /// Backend-supplied reason.
        reason: String,
    },
}
