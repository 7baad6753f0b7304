//! Assembly of canonical features from relational rows.
#![forbid(unsafe_code)]

use blitzfind_core::{Feature, Geometry};

use crate::ingest::relational::RawRow;

/// Build the canonical feature for `row`.
///
/// Returns `None` when the row has no derivable identifier. Reserved columns
/// never reach the property bag because [`RawRow`] holds them apart, and
/// null-valued columns are dropped.
///
/// # Examples
/// ```
/// use blitzfind_data::ingest::{ColumnValue, RawRow, build_feature};
///
/// let row = RawRow::new()
///     .with_identifier(ColumnValue::Text("BLD001".into()))
///     .with_column("address", ColumnValue::Text("1 Quay Street".into()))
///     .with_column("poi_id", ColumnValue::Null);
/// let feature = build_feature(row, None).expect("row has an identifier");
/// assert_eq!(feature.id.as_str(), "BLD001");
/// assert_eq!(feature.properties.len(), 1);
/// ```
#[must_use]
pub fn build_feature(row: RawRow, geometry: Option<Geometry>) -> Option<Feature> {
    let id = row.identifier()?;
    Some(Feature::new(id, geometry, row.into_properties()))
}
