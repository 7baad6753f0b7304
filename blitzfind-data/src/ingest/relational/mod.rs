//! Import of relational (SQLite, optionally SpatiaLite) sources.
//!
//! One import call runs the whole pipeline once: probe the source for the
//! spatial catalog, load the extension when the catalog is present, then
//! stream rows through geometry extraction, feature assembly and
//! reconciliation. Capability and extension state are never cached between
//! calls.

use std::io::Write;
use std::path::Path;

use blitzfind_core::FeatureStore;
use log::{info, warn};
use tempfile::NamedTempFile;

use crate::ingest::{
    GeometryExtractor, ImportError, ImportSummary, UpsertReconciler, build_feature,
};

mod extension;
mod probe;
mod row;
mod source;

pub use extension::{ExtensionCandidates, LoadResult, load_spatial_extension};
pub use probe::{Capability, SPATIAL_CATALOG_TABLE, probe_spatial_capability};
pub use row::{ColumnValue, RawRow};
pub use source::RENDERED_GEOMETRY_ALIAS;

use source::TableLayout;

/// Caller-supplied parameters for a relational import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalImportOptions {
    /// Table to read.
    pub table_name: String,
    /// Column holding the feature identifier.
    pub id_column: String,
    /// Column holding the geometry.
    pub geometry_column: String,
    /// Free-text `POINT` descriptor column used as a last resort.
    pub fallback_column: Option<String>,
    /// Extension library paths, tried in order.
    pub extension_candidates: ExtensionCandidates,
}

impl Default for RelationalImportOptions {
    fn default() -> Self {
        Self {
            table_name: "building".to_owned(),
            id_column: "marking_pg_id".to_owned(),
            geometry_column: "geom".to_owned(),
            fallback_column: Some("centre_point".to_owned()),
            extension_candidates: ExtensionCandidates::default(),
        }
    }
}

impl RelationalImportOptions {
    fn layout(&self) -> TableLayout<'_> {
        TableLayout {
            table: &self.table_name,
            id_column: &self.id_column,
            geometry_column: &self.geometry_column,
        }
    }
}

/// Outcome of a relational import.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalImportReport {
    /// Counts and bounds.
    pub summary: ImportSummary,
    /// Whether the source carries the spatial catalog.
    pub capability: Capability,
    /// Whether, and from where, the spatial extension loaded.
    pub extension: LoadResult,
}

impl RelationalImportReport {
    /// Whether the source was written by a spatial-extension-aware tool.
    #[must_use]
    pub const fn spatial_capability_detected(&self) -> bool {
        self.capability.supported
    }
}

/// Import a relational source supplied as raw bytes.
///
/// The payload is staged into a temporary file that is removed when the
/// import returns.
///
/// # Errors
/// See [`import_relational_path`]; staging failures are source-kind errors.
///
/// # Examples
/// ```
/// use blitzfind_core::test_support::MemoryStore;
/// use blitzfind_data::ingest::{ExtensionCandidates, RelationalImportOptions, import_relational_source};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("source.sqlite");
/// let conn = rusqlite::Connection::open(&path)?;
/// conn.execute_batch(
///     "CREATE TABLE building (marking_pg_id TEXT, geom TEXT, centre_point TEXT);
///      INSERT INTO building VALUES ('B1', NULL, 'POINT (121.5 31.2)');",
/// )?;
/// drop(conn);
///
/// let options = RelationalImportOptions {
///     extension_candidates: ExtensionCandidates::none(),
///     ..RelationalImportOptions::default()
/// };
/// let mut store = MemoryStore::default();
/// let report = import_relational_source(&std::fs::read(&path)?, &options, &mut store)?;
/// assert!(!report.spatial_capability_detected());
/// assert_eq!(report.summary.imported, 1);
/// # Ok(())
/// # }
/// ```
pub fn import_relational_source<S>(
    bytes: &[u8],
    options: &RelationalImportOptions,
    store: &mut S,
) -> Result<RelationalImportReport, ImportError>
where
    S: FeatureStore + ?Sized,
{
    let mut staged = NamedTempFile::new().map_err(|source| ImportError::StageSource { source })?;
    staged
        .write_all(bytes)
        .and_then(|()| staged.flush())
        .map_err(|source| ImportError::StageSource { source })?;
    import_relational_path(staged.path(), options, store)
}

/// Import the relational source stored at `path`.
///
/// The source is opened read-only. Rows whose identifier column is `NULL`
/// are excluded by the query and never counted.
///
/// # Errors
/// - format kind when the file is not a SQLite database;
/// - schema kind when the table or a reserved column is missing;
/// - source kind when opening or querying fails; a read that fails after
///   the first row is [`ImportError::ReadInterrupted`] and carries the counts
///   accumulated so far;
/// - [`ImportError::Storage`] when the store refuses a write, carrying the
///   counts accumulated so far.
pub fn import_relational_path<S>(
    path: &Path,
    options: &RelationalImportOptions,
    store: &mut S,
) -> Result<RelationalImportReport, ImportError>
where
    S: FeatureStore + ?Sized,
{
    info!(
        "importing table {:?} from {}",
        options.table_name,
        path.display()
    );
    let connection = source::open_source(path)?;
    let capability = probe_spatial_capability(&connection);
    let extension = if capability.supported {
        let result = load_spatial_extension(&connection, &options.extension_candidates);
        if !result.loaded {
            warn!("spatial catalog present but no extension loaded; reading raw geometry");
        }
        result
    } else {
        LoadResult::default()
    };

    let layout = options.layout();
    source::verify_layout(&connection, layout)?;
    let sql = source::row_query(layout, extension.loaded);
    let extractor =
        GeometryExtractor::new(extension.loaded, options.fallback_column.as_deref());

    let mut reconciler = UpsertReconciler::new(store);
    let streamed = source::for_each_row(&connection, &sql, layout, extension.loaded, |row| {
        let geometry = extractor.extract(&row);
        match build_feature(row, geometry) {
            Some(feature) => reconciler.reconcile(feature).map(|_| ()),
            None => {
                reconciler.skip_unit();
                Ok(())
            }
        }
    });
    if let Err(err) = streamed {
        let err = err.after_units(reconciler.summary());
        warn!("relational import aborted: {err}");
        return Err(err);
    }

    let summary = reconciler.finish();
    info!(
        "relational import finished: {} imported, {} updated, {} processed",
        summary.imported, summary.updated, summary.total_processed
    );
    Ok(RelationalImportReport {
        summary,
        capability,
        extension,
    })
}
