//! Import pipeline: sources in, canonical features out.
//!
//! Both entrypoints make a single sequential pass over their source units
//! and write each feature through a [`blitzfind_core::FeatureStore`] as soon
//! as it is built. There is no import-wide transaction.

use geo::{Coord, Rect};

mod builder;
mod collection;
mod error;
mod geometry;
mod reconcile;
mod relational;

pub use builder::build_feature;
pub use collection::{import_feature_collection, read_feature_collection};
pub use error::{ImportError, ImportErrorKind};
pub use geometry::{GeometryExtractor, GeometrySource, parse_point_descriptor};
pub use reconcile::{Reconciliation, UpsertReconciler};
pub use relational::{
    Capability, ColumnValue, ExtensionCandidates, LoadResult, RENDERED_GEOMETRY_ALIAS, RawRow,
    RelationalImportOptions, RelationalImportReport, SPATIAL_CATALOG_TABLE,
    import_relational_path, import_relational_source, load_spatial_extension,
    probe_spatial_capability,
};

/// Counts returned by every import call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSummary {
    /// Features written under a previously unknown identifier.
    pub imported: u64,
    /// Features that overwrote an existing record.
    pub updated: u64,
    /// Source units handled, including those skipped for lack of an
    /// identifier.
    pub total_processed: u64,
    /// Bounding box of every finite position in reconciled geometries.
    /// Coordinates are taken as stored, `x` first.
    pub bounds: Option<Rect<f64>>,
}

impl ImportSummary {
    fn include_position(&mut self, position: Coord<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(position.x),
                    y: existing.min().y.min(position.y),
                };
                let max = Coord {
                    x: existing.max().x.max(position.x),
                    y: existing.max().y.max(position.y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(Rect::new(position, position)),
        }
    }
}
