//! Facade crate for the BlitzFind geospatial feature store.
//!
//! This crate re-exports the core domain types and exposes the SQLite store
//! and the import pipeline behind feature flags.

#![forbid(unsafe_code)]

pub use blitzfind_core::{
    Feature, FeatureId, FeatureIdError, FeatureStore, Geometry, Properties, RecordPage,
    RecordSummary, StoreError, StoredRecord, Timestamp,
};

#[cfg(feature = "store-sqlite")]
pub use blitzfind_core::SqliteFeatureStore;

#[cfg(feature = "test-support")]
pub use blitzfind_core::test_support::MemoryStore;

#[cfg(feature = "import")]
pub use blitzfind_data::{
    ImportError, ImportErrorKind, ImportSummary, RelationalImportOptions, RelationalImportReport,
    import_feature_collection, import_relational_path, import_relational_source,
};
