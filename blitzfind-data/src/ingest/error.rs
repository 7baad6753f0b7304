//! Error types returned by the import entrypoints.

use std::path::PathBuf;

use blitzfind_core::{FeatureId, StoreError};
use thiserror::Error;

use crate::ingest::ImportSummary;

/// Broad classification of an [`ImportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorKind {
    /// The payload is not a well-formed source of the declared format.
    Format,
    /// The relational source lacks a required table or column.
    Schema,
    /// The source could not be staged, opened or queried.
    Source,
    /// The store refused a write; earlier writes stand.
    Storage,
}

/// Errors returned by the import entrypoints.
///
/// Every variant aborts the import. Rows reconciled before the failure
/// remain in the store; [`ImportError::partial_summary`] reports them.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload is not valid JSON text.
    #[error("payload is not valid JSON")]
    InvalidJson {
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },
    /// The top level is not a `FeatureCollection` object.
    #[error("expected a FeatureCollection, found {found}")]
    NotFeatureCollection {
        /// Description of what the top level held instead.
        found: String,
    },
    /// The collection has no `features` array.
    #[error("FeatureCollection has no features array")]
    MissingFeatures,
    /// The relational payload is not a SQLite database.
    #[error("payload is not a SQLite database")]
    NotADatabase {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The named table does not exist.
    #[error("table {table:?} does not exist")]
    MissingTable {
        /// Requested table name.
        table: String,
    },
    /// A required column is absent from the table.
    #[error("table {table:?} has no column {column:?}")]
    MissingColumn {
        /// Requested table name.
        table: String,
        /// Missing column name.
        column: String,
    },
    /// Staging the payload into a temporary file failed.
    #[error("failed to stage source payload")]
    StageSource {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the relational source failed.
    #[error("failed to open source database at {path:?}")]
    OpenSource {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Reading from the relational source failed.
    #[error("failed to {operation} in source database")]
    Query {
        /// Short description of the failing step.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Reading the relational source failed after some units were handled.
    #[error("failed to {operation} in source database after {processed} units", processed = .summary.total_processed)]
    ReadInterrupted {
        /// Short description of the failing step.
        operation: &'static str,
        /// Counts accumulated before the failure.
        summary: ImportSummary,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The store refused a write.
    #[error("failed to store feature {id} after {processed} units", processed = .summary.total_processed)]
    Storage {
        /// Identifier of the feature whose write failed.
        id: FeatureId,
        /// Counts accumulated before the failure.
        summary: ImportSummary,
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

impl ImportError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ImportErrorKind {
        match self {
            Self::InvalidJson { .. }
            | Self::NotFeatureCollection { .. }
            | Self::MissingFeatures
            | Self::NotADatabase { .. } => ImportErrorKind::Format,
            Self::MissingTable { .. } | Self::MissingColumn { .. } => ImportErrorKind::Schema,
            Self::StageSource { .. }
            | Self::OpenSource { .. }
            | Self::Query { .. }
            | Self::ReadInterrupted { .. } => ImportErrorKind::Source,
            Self::Storage { .. } => ImportErrorKind::Storage,
        }
    }

    /// Counts accumulated before the import aborted mid-stream.
    ///
    /// Present for store refusals and for source reads that fail after the
    /// first unit was handled. `None` when the import stopped before any
    /// unit was read.
    #[must_use]
    pub const fn partial_summary(&self) -> Option<&ImportSummary> {
        match self {
            Self::Storage { summary, .. } | Self::ReadInterrupted { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Attach the counts of a stream that stopped on a source read.
    ///
    /// Read failures become [`ImportError::ReadInterrupted`] once at least one
    /// unit was handled; everything else is returned unchanged.
    #[must_use]
    pub(crate) fn after_units(self, summary: &ImportSummary) -> Self {
        if summary.total_processed == 0 {
            return self;
        }
        match self {
            Self::Query { operation, source } => Self::ReadInterrupted {
                operation,
                summary: summary.clone(),
                source,
            },
            Self::NotADatabase { source } => Self::ReadInterrupted {
                operation: "read row",
                summary: summary.clone(),
                source,
            },
            other => other,
        }
    }
}
