//! Error types emitted by the BlitzFind CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use blitzfind_core::{FeatureId, FeatureIdError, StoreError};
use blitzfind_data::ImportError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the BlitzFind CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading the import payload failed.
    #[error("failed to read source at {path:?}: {source}")]
    ReadSource {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Creating the directory that holds the store database failed.
    #[error("failed to prepare store directory for {path:?}: {source}")]
    PrepareStore {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the store database failed.
    #[error("failed to open store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// The import pipeline rejected the source.
    #[error("import from {path:?} failed: {source}")]
    Import {
        path: Utf8PathBuf,
        #[source]
        source: ImportError,
    },
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The supplied record identifier is unusable.
    #[error("invalid record id: {0}")]
    InvalidId(#[from] FeatureIdError),
    /// The `set` payload is not a feature body.
    #[error("value for {id} is not a feature: {source}")]
    ParseValue {
        id: FeatureId,
        #[source]
        source: serde_json::Error,
    },
    /// No record is stored under the requested identifier.
    #[error("no record stored under {id}")]
    RecordNotFound { id: FeatureId },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
