//! Record commands: query, set, delete and list.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;

use blitzfind_core::{Feature, FeatureId, FeatureStore, RecordPage, RecordSummary};

use crate::{
    ARG_DB, ARG_ID, ARG_LIMIT, ARG_SKIP, ARG_VALUE, CliError, ENV_DELETE_ID, ENV_QUERY_ID,
    ENV_SET_ID, ENV_SET_VALUE, open_store, resolve_db, write_json,
};

pub(crate) const DEFAULT_SKIP: u64 = 0;
pub(crate) const DEFAULT_LIMIT: u64 = 100;

/// CLI arguments for the `query` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "query", about = "Fetch a record by identifier")]
#[ortho_config(prefix = "BLITZFIND")]
pub(crate) struct QueryArgs {
    /// Record identifier.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<String>,
    /// Path to the store database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

/// CLI arguments for the `set` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "set",
    long_about = "Create or overwrite a record. The value must be a GeoJSON \
                 Feature object; its own id is replaced by the one given \
                 on the command line.",
    about = "Store a feature under an identifier"
)]
#[ortho_config(prefix = "BLITZFIND")]
pub(crate) struct SetArgs {
    /// Record identifier.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<String>,
    /// Feature JSON.
    #[arg(value_name = "json")]
    #[serde(default)]
    pub(crate) value: Option<String>,
    /// Path to the store database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

/// CLI arguments for the `delete` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "delete", about = "Remove a record by identifier")]
#[ortho_config(prefix = "BLITZFIND")]
pub(crate) struct DeleteArgs {
    /// Record identifier.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<String>,
    /// Path to the store database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

/// CLI arguments for the `list` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "list", about = "Page through stored records in identifier order")]
#[ortho_config(prefix = "BLITZFIND")]
pub(crate) struct ListArgs {
    /// Records to skip (default 0).
    #[arg(long = ARG_SKIP, value_name = "count")]
    #[serde(default)]
    pub(crate) skip: Option<u64>,
    /// Maximum records to return (default 100).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<u64>,
    /// Path to the store database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

/// Resolved configuration for commands addressing a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordConfig {
    pub(crate) id: FeatureId,
    pub(crate) db: Utf8PathBuf,
}

impl RecordConfig {
    fn resolve(
        id: Option<String>,
        db: Option<Utf8PathBuf>,
        env: &'static str,
    ) -> Result<Self, CliError> {
        let raw = id.ok_or(CliError::MissingArgument { field: ARG_ID, env })?;
        Ok(Self {
            id: FeatureId::new(raw)?,
            db: resolve_db(db),
        })
    }
}

impl TryFrom<QueryArgs> for RecordConfig {
    type Error = CliError;

    fn try_from(args: QueryArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.id, args.db, ENV_QUERY_ID)
    }
}

impl TryFrom<DeleteArgs> for RecordConfig {
    type Error = CliError;

    fn try_from(args: DeleteArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.id, args.db, ENV_DELETE_ID)
    }
}

/// Resolved `set` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SetConfig {
    pub(crate) record: RecordConfig,
    pub(crate) feature: Feature,
}

impl TryFrom<SetArgs> for SetConfig {
    type Error = CliError;

    fn try_from(args: SetArgs) -> Result<Self, Self::Error> {
        let record = RecordConfig::resolve(args.id, args.db, ENV_SET_ID)?;
        let raw = args.value.ok_or(CliError::MissingArgument {
            field: ARG_VALUE,
            env: ENV_SET_VALUE,
        })?;
        let feature = decode_feature(&record.id, &raw)?;
        Ok(Self { record, feature })
    }
}

/// Decode a feature body, overriding whatever identifier it carries.
fn decode_feature(id: &FeatureId, raw: &str) -> Result<Feature, CliError> {
    let parse_error = |source| CliError::ParseValue {
        id: id.clone(),
        source,
    };
    let mut value: Value = serde_json::from_str(raw).map_err(parse_error)?;
    if let Value::Object(body) = &mut value {
        body.insert("id".to_owned(), Value::String(id.as_str().to_owned()));
    }
    serde_json::from_value(value).map_err(parse_error)
}

/// Resolved `list` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListConfig {
    pub(crate) skip: u64,
    pub(crate) limit: u64,
    pub(crate) db: Utf8PathBuf,
}

impl From<ListArgs> for ListConfig {
    fn from(args: ListArgs) -> Self {
        Self {
            skip: args.skip.unwrap_or(DEFAULT_SKIP),
            limit: args.limit.unwrap_or(DEFAULT_LIMIT),
            db: resolve_db(args.db),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryOutput {
    pub(crate) found: bool,
    pub(crate) id: FeatureId,
    pub(crate) value: Option<Feature>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteOutput {
    pub(crate) deleted: bool,
    pub(crate) id: FeatureId,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListOutput {
    pub(crate) total: u64,
    pub(crate) skip: u64,
    pub(crate) limit: u64,
    pub(crate) data: Vec<RecordSummary>,
}

impl From<RecordPage> for ListOutput {
    fn from(page: RecordPage) -> Self {
        Self {
            total: page.total,
            skip: page.skip,
            limit: page.limit,
            data: page.records,
        }
    }
}

pub(crate) fn run_query_with(args: QueryArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = RecordConfig::try_from(merged)?;
    let output = execute_query(&config)?;
    write_json(writer, &output)
}

pub(crate) fn execute_query(config: &RecordConfig) -> Result<QueryOutput, CliError> {
    let store = open_store(&config.db)?;
    let value = store.get(&config.id)?.map(|record| record.value);
    Ok(QueryOutput {
        found: value.is_some(),
        id: config.id.clone(),
        value,
    })
}

pub(crate) fn run_set_with(args: SetArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = SetConfig::try_from(merged)?;
    let summary = execute_set(config)?;
    write_json(writer, &summary)
}

pub(crate) fn execute_set(config: SetConfig) -> Result<RecordSummary, CliError> {
    let mut store = open_store(&config.record.db)?;
    let record = store.put(&config.record.id, config.feature)?;
    Ok(record.summary())
}

pub(crate) fn run_delete_with(args: DeleteArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = RecordConfig::try_from(merged)?;
    let output = execute_delete(&config)?;
    write_json(writer, &output)
}

pub(crate) fn execute_delete(config: &RecordConfig) -> Result<DeleteOutput, CliError> {
    let mut store = open_store(&config.db)?;
    if !store.delete(&config.id)? {
        return Err(CliError::RecordNotFound {
            id: config.id.clone(),
        });
    }
    Ok(DeleteOutput {
        deleted: true,
        id: config.id.clone(),
    })
}

pub(crate) fn run_list_with(args: ListArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let output = execute_list(&ListConfig::from(merged))?;
    write_json(writer, &output)
}

pub(crate) fn execute_list(config: &ListConfig) -> Result<ListOutput, CliError> {
    let store = open_store(&config.db)?;
    let page = store.list(config.skip, config.limit)?;
    Ok(ListOutput::from(page))
}

#[cfg(test)]
pub(crate) fn list_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ListConfig, CliError> {
    let merged = ListArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(ListConfig::from(merged))
}
