//! Import commands for the BlitzFind CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;

use blitzfind_data::{
    ImportSummary, RelationalImportOptions, RelationalImportReport, import_feature_collection,
    import_relational_path,
};

use crate::{
    ARG_DB, ARG_FALLBACK_COLUMN, ARG_GEOM_COLUMN, ARG_ID_COLUMN, ARG_SOURCE, ARG_TABLE, CliError,
    ENV_IMPORT_SOURCE, ENV_SPATIALITE_SOURCE, open_store, require_existing, resolve_db,
    write_json,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Import every identifiable feature of a GeoJSON \
                 FeatureCollection file into the store. Features that \
                 already exist are overwritten and keep their creation time.",
    about = "Import a GeoJSON FeatureCollection"
)]
#[ortho_config(prefix = "BLITZFIND")]
pub(crate) struct ImportArgs {
    /// Path to the FeatureCollection file.
    #[arg(value_name = "file")]
    #[serde(default)]
    pub(crate) source: Option<Utf8PathBuf>,
    /// Path to the store database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) source: Utf8PathBuf,
    pub(crate) db: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let source = args.source.ok_or(CliError::MissingArgument {
            field: ARG_SOURCE,
            env: ENV_IMPORT_SOURCE,
        })?;
        Ok(Self {
            source,
            db: resolve_db(args.db),
        })
    }
}

/// CLI arguments for the `import-spatialite` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import-spatialite",
    long_about = "Import one table of a SQLite or SpatiaLite database. The \
                 spatial extension is loaded when the source carries the \
                 spatial catalog and a library is available; otherwise \
                 geometry is read from the raw column.",
    about = "Import a SQLite or SpatiaLite table"
)]
#[ortho_config(prefix = "BLITZFIND")]
pub(crate) struct SpatialiteArgs {
    /// Path to the database file.
    #[arg(value_name = "file")]
    #[serde(default)]
    pub(crate) source: Option<Utf8PathBuf>,
    /// Path to the store database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Table to import (default `building`).
    #[arg(long = ARG_TABLE, value_name = "name")]
    #[serde(default)]
    pub(crate) table: Option<String>,
    /// Identifier column (default `marking_pg_id`).
    #[arg(long = ARG_ID_COLUMN, value_name = "name")]
    #[serde(default)]
    pub(crate) id_column: Option<String>,
    /// Geometry column (default `geom`).
    #[arg(long = ARG_GEOM_COLUMN, value_name = "name")]
    #[serde(default)]
    pub(crate) geom_column: Option<String>,
    /// `POINT (x y)` text column tried last (default `centre_point`; an
    /// empty value disables it).
    #[arg(long = ARG_FALLBACK_COLUMN, value_name = "name")]
    #[serde(default)]
    pub(crate) fallback_column: Option<String>,
}

impl SpatialiteArgs {
    pub(crate) fn into_config(self) -> Result<SpatialiteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SpatialiteConfig::try_from(merged)
    }
}

/// Resolved `import-spatialite` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpatialiteConfig {
    pub(crate) source: Utf8PathBuf,
    pub(crate) db: Utf8PathBuf,
    pub(crate) options: RelationalImportOptions,
}

impl TryFrom<SpatialiteArgs> for SpatialiteConfig {
    type Error = CliError;

    fn try_from(args: SpatialiteArgs) -> Result<Self, Self::Error> {
        let source = args.source.ok_or(CliError::MissingArgument {
            field: ARG_SOURCE,
            env: ENV_SPATIALITE_SOURCE,
        })?;
        let defaults = RelationalImportOptions::default();
        let fallback_column = match args.fallback_column {
            Some(column) if column.is_empty() => None,
            Some(column) => Some(column),
            None => defaults.fallback_column,
        };
        let options = RelationalImportOptions {
            table_name: args.table.unwrap_or(defaults.table_name),
            id_column: args.id_column.unwrap_or(defaults.id_column),
            geometry_column: args.geom_column.unwrap_or(defaults.geometry_column),
            fallback_column,
            extension_candidates: defaults.extension_candidates,
        };
        Ok(Self {
            source,
            db: resolve_db(args.db),
            options,
        })
    }
}

/// JSON document printed after an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ImportOutput {
    pub(crate) imported_count: u64,
    pub(crate) updated_count: u64,
    pub(crate) total_processed: u64,
    /// `[min_x, min_y, max_x, max_y]`.
    pub(crate) bounds: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) spatial_capability_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) extension_path: Option<String>,
}

impl From<&ImportSummary> for ImportOutput {
    fn from(summary: &ImportSummary) -> Self {
        Self {
            imported_count: summary.imported,
            updated_count: summary.updated,
            total_processed: summary.total_processed,
            bounds: summary
                .bounds
                .map(|rect| [rect.min().x, rect.min().y, rect.max().x, rect.max().y]),
            spatial_capability_detected: None,
            extension_path: None,
        }
    }
}

impl From<&RelationalImportReport> for ImportOutput {
    fn from(report: &RelationalImportReport) -> Self {
        Self {
            spatial_capability_detected: Some(report.spatial_capability_detected()),
            extension_path: report
                .extension
                .path
                .as_ref()
                .map(|path| path.display().to_string()),
            ..Self::from(&report.summary)
        }
    }
}

pub(crate) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_import_config(args)?;
    let output = execute_import(&config)?;
    write_json(writer, &output)
}

fn resolve_import_config(args: ImportArgs) -> Result<ImportConfig, CliError> {
    let config = args.into_config()?;
    require_existing(&config.source, ARG_SOURCE)?;
    Ok(config)
}

pub(crate) fn execute_import(config: &ImportConfig) -> Result<ImportOutput, CliError> {
    let bytes =
        blitzfind_fs::read_source_bytes(&config.source).map_err(|source| CliError::ReadSource {
            path: config.source.clone(),
            source,
        })?;
    let mut store = open_store(&config.db)?;
    debug!("importing {} into {}", config.source, config.db);
    let summary =
        import_feature_collection(&bytes, &mut store).map_err(|source| CliError::Import {
            path: config.source.clone(),
            source,
        })?;
    Ok(ImportOutput::from(&summary))
}

pub(crate) fn run_spatialite_with(
    args: SpatialiteArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_spatialite_config(args)?;
    let output = execute_spatialite(&config)?;
    write_json(writer, &output)
}

fn resolve_spatialite_config(args: SpatialiteArgs) -> Result<SpatialiteConfig, CliError> {
    let config = args.into_config()?;
    require_existing(&config.source, ARG_SOURCE)?;
    Ok(config)
}

pub(crate) fn execute_spatialite(config: &SpatialiteConfig) -> Result<ImportOutput, CliError> {
    let mut store = open_store(&config.db)?;
    debug!(
        "importing table {} of {} into {}",
        config.options.table_name, config.source, config.db
    );
    let report = import_relational_path(config.source.as_std_path(), &config.options, &mut store)
        .map_err(|source| CliError::Import {
            path: config.source.clone(),
            source,
        })?;
    Ok(ImportOutput::from(&report))
}

#[cfg(test)]
pub(crate) fn import_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ImportConfig, CliError> {
    let merged = ImportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ImportConfig::try_from(merged)
}

#[cfg(test)]
pub(crate) fn spatialite_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SpatialiteConfig, CliError> {
    let merged = SpatialiteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SpatialiteConfig::try_from(merged)
}
