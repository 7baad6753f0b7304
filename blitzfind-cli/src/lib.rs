//! Command-line interface for the BlitzFind feature store.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;

use blitzfind_core::SqliteFeatureStore;

mod error;
mod import;
mod records;

pub use error::CliError;

use import::{ImportArgs, SpatialiteArgs};
use records::{DeleteArgs, ListArgs, QueryArgs, SetArgs};

pub(crate) const DEFAULT_DB: &str = "blitzfind.db";

pub(crate) const ARG_DB: &str = "db";
pub(crate) const ARG_SOURCE: &str = "source";
pub(crate) const ARG_ID: &str = "id";
pub(crate) const ARG_VALUE: &str = "value";
pub(crate) const ARG_TABLE: &str = "table";
pub(crate) const ARG_ID_COLUMN: &str = "id-column";
pub(crate) const ARG_GEOM_COLUMN: &str = "geom-column";
pub(crate) const ARG_FALLBACK_COLUMN: &str = "fallback-column";
pub(crate) const ARG_SKIP: &str = "skip";
pub(crate) const ARG_LIMIT: &str = "limit";

pub(crate) const ENV_IMPORT_SOURCE: &str = "BLITZFIND_CMDS_IMPORT_SOURCE";
pub(crate) const ENV_SPATIALITE_SOURCE: &str = "BLITZFIND_CMDS_IMPORT_SPATIALITE_SOURCE";
pub(crate) const ENV_QUERY_ID: &str = "BLITZFIND_CMDS_QUERY_ID";
pub(crate) const ENV_SET_ID: &str = "BLITZFIND_CMDS_SET_ID";
pub(crate) const ENV_SET_VALUE: &str = "BLITZFIND_CMDS_SET_VALUE";
pub(crate) const ENV_DELETE_ID: &str = "BLITZFIND_CMDS_DELETE_ID";

/// Install the process logger, filtered by `RUST_LOG` and defaulting to `warn`.
///
/// # Errors
/// Returns [`log::SetLoggerError`] when a logger is already installed.
pub fn init_logging() -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .try_init()
}

/// Run the BlitzFind CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Import(args) => import::run_import_with(args, writer),
        Command::ImportSpatialite(args) => import::run_spatialite_with(args, writer),
        Command::Query(args) => records::run_query_with(args, writer),
        Command::Set(args) => records::run_set_with(args, writer),
        Command::Delete(args) => records::run_delete_with(args, writer),
        Command::List(args) => records::run_list_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "blitzfind",
    about = "Import geospatial sources into a local BlitzFind feature store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a GeoJSON FeatureCollection file.
    Import(ImportArgs),
    /// Import a table from a SQLite or SpatiaLite database file.
    ImportSpatialite(SpatialiteArgs),
    /// Fetch a single record by identifier.
    Query(QueryArgs),
    /// Create or overwrite a record with a feature body.
    Set(SetArgs),
    /// Remove a record by identifier.
    Delete(DeleteArgs),
    /// Page through stored record identifiers.
    List(ListArgs),
}

/// Open the store database, creating its parent directory when missing.
pub(crate) fn open_store(path: &Utf8Path) -> Result<SqliteFeatureStore, CliError> {
    blitzfind_fs::ensure_parent_dir(path).map_err(|source| CliError::PrepareStore {
        path: path.to_path_buf(),
        source,
    })?;
    SqliteFeatureStore::open(path.as_std_path()).map_err(|source| CliError::OpenStore {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn resolve_db(db: Option<Utf8PathBuf>) -> Utf8PathBuf {
    db.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DB))
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match blitzfind_fs::is_regular_file(path) {
        Ok(true) => Ok(()),
        Ok(false) if path.exists() => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    payload: &T,
) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(payload).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(rendered.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
