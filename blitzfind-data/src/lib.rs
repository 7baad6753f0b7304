//! Import pipeline for the BlitzFind feature store.
//!
//! Responsibilities:
//! - Read GeoJSON feature collections and SQLite/SpatiaLite tables.
//! - Detect spatial capability and load the native extension when present.
//! - Extract geometry through an ordered fallback chain.
//! - Reconcile features into a [`blitzfind_core::FeatureStore`].
//!
//! Boundaries:
//! - Storage semantics live in `blitzfind-core`.
//! - No transport or command-line concerns.
//!
//! Invariants:
//! - No global mutable state; extension paths are injected per call.
//! - A single bad geometry never aborts an import.

pub mod ingest;

pub use ingest::{
    ImportError, ImportErrorKind, ImportSummary, RelationalImportOptions, RelationalImportReport,
    import_feature_collection, import_relational_path, import_relational_source,
};
