//! Import of GeoJSON `FeatureCollection` payloads.
#![forbid(unsafe_code)]

use blitzfind_core::{Feature, FeatureId, FeatureStore, Geometry, Properties};
use log::{debug, info};
use serde_json::Value;

use crate::ingest::{ImportError, ImportSummary, UpsertReconciler};

/// Parse `bytes` as a `FeatureCollection` and return its raw feature entries.
///
/// # Errors
/// Returns a format-kind [`ImportError`] when the payload is not UTF-8 JSON,
/// the top level is not an object whose `type` is `FeatureCollection`, or
/// `features` is not an array.
pub fn read_feature_collection(bytes: &[u8]) -> Result<Vec<Value>, ImportError> {
    let document: Value =
        serde_json::from_slice(bytes).map_err(|source| ImportError::InvalidJson { source })?;
    let mut top = match document {
        Value::Object(top) => top,
        other => {
            return Err(ImportError::NotFeatureCollection {
                found: json_kind(&other).to_owned(),
            });
        }
    };
    match top.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        Some(other) => {
            return Err(ImportError::NotFeatureCollection {
                found: format!("type {other:?}"),
            });
        }
        None => {
            return Err(ImportError::NotFeatureCollection {
                found: "an object without a type".to_owned(),
            });
        }
    }
    match top.remove("features") {
        Some(Value::Array(features)) => Ok(features),
        _ => Err(ImportError::MissingFeatures),
    }
}

/// Import every feature of a `FeatureCollection` into `store`.
///
/// Features without a derivable identifier are skipped but still counted in
/// `total_processed`. Writes are not rolled back when a later write fails.
///
/// # Errors
/// Returns a format-kind [`ImportError`] before any write when the payload
/// is malformed, and [`ImportError::Storage`] when the store refuses a write.
///
/// # Examples
/// ```
/// use blitzfind_core::test_support::MemoryStore;
/// use blitzfind_data::ingest::import_feature_collection;
///
/// # fn main() -> Result<(), blitzfind_data::ingest::ImportError> {
/// let payload = br#"{"type": "FeatureCollection", "features": [
///     {"type": "Feature", "id": "a", "geometry": null, "properties": {}},
///     {"type": "Feature", "geometry": null, "properties": {"id": 7}},
///     {"type": "Feature", "geometry": null, "properties": {"name": "anonymous"}}
/// ]}"#;
/// let mut store = MemoryStore::default();
/// let summary = import_feature_collection(payload, &mut store)?;
/// assert_eq!(summary.total_processed, 3);
/// assert_eq!(summary.imported + summary.updated, 2);
/// # Ok(())
/// # }
/// ```
pub fn import_feature_collection<S>(
    bytes: &[u8],
    store: &mut S,
) -> Result<ImportSummary, ImportError>
where
    S: FeatureStore + ?Sized,
{
    let features = read_feature_collection(bytes)?;
    info!("importing feature collection with {} features", features.len());

    let mut reconciler = UpsertReconciler::new(store);
    for entry in features {
        match collection_feature(entry) {
            Some(feature) => {
                reconciler.reconcile(feature)?;
            }
            None => {
                debug!("skipping feature without a derivable identifier");
                reconciler.skip_unit();
            }
        }
    }

    let summary = reconciler.finish();
    info!(
        "feature collection import finished: {} imported, {} updated, {} processed",
        summary.imported, summary.updated, summary.total_processed
    );
    Ok(summary)
}

/// Normalise one collection entry, or `None` when it has no identifier.
fn collection_feature(entry: Value) -> Option<Feature> {
    let Value::Object(mut object) = entry else {
        return None;
    };
    let properties = match object.remove("properties") {
        Some(Value::Object(properties)) => properties,
        _ => Properties::new(),
    };
    let id = object
        .get("id")
        .and_then(identifier_from)
        .or_else(|| properties.get("id").and_then(identifier_from))?;
    let geometry = object.remove("geometry").and_then(Geometry::from_value);
    Some(Feature::new(id, geometry, properties))
}

/// Derive an identifier from a JSON string or number.
fn identifier_from(value: &Value) -> Option<FeatureId> {
    match value {
        Value::String(text) => FeatureId::new(text.as_str()).ok(),
        Value::Number(number) => FeatureId::new(number.to_string()).ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
