//! Geometry extraction fallback chain for relational rows.
#![forbid(unsafe_code)]

use std::sync::LazyLock;

use blitzfind_core::Geometry;
use log::debug;
use regex::Regex;
use serde_json::Value;

use crate::ingest::relational::{ColumnValue, RawRow};

/// `POINT` with an optional `Z` marker followed by a parenthesised list of
/// whitespace-separated numbers. `None` only if the literal fails to compile,
/// which the unit tests rule out.
static POINT_DESCRIPTOR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\bPOINT\s*Z?\s*\(\s*([-+0-9.eE]+(?:\s+[-+0-9.eE]+)*)\s*\)").ok()
});

/// Which stage of the fallback chain produced a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// Text rendered by the spatial extension.
    Rendered,
    /// The geometry column read as stored.
    RawColumn,
    /// A point recovered from the free-text descriptor column.
    PointDescriptor,
}

/// Produces a canonical geometry for a row, first match wins.
///
/// The chain is: extension-rendered text (only when the extension loaded),
/// then the raw geometry column, then the optional point descriptor column.
/// A failing stage falls through silently; no stage aborts the import.
#[derive(Debug, Clone, Copy)]
pub struct GeometryExtractor<'a> {
    extension_loaded: bool,
    fallback_column: Option<&'a str>,
}

impl<'a> GeometryExtractor<'a> {
    /// Configure the chain for one import run.
    #[must_use]
    pub const fn new(extension_loaded: bool, fallback_column: Option<&'a str>) -> Self {
        Self {
            extension_loaded,
            fallback_column,
        }
    }

    /// Extract a geometry from `row`, reporting which stage matched.
    #[must_use]
    pub fn extract_with_source(&self, row: &RawRow) -> Option<(Geometry, GeometrySource)> {
        if self.extension_loaded {
            if let Some(geometry) = row.rendered_geometry().and_then(parse_structured) {
                return Some((geometry, GeometrySource::Rendered));
            }
            debug!("rendered geometry unavailable, reading raw column");
        }

        if let Some(geometry) = row.raw_geometry().and_then(parse_structured) {
            return Some((geometry, GeometrySource::RawColumn));
        }

        let descriptor = self
            .fallback_column
            .and_then(|column| row.column(column))
            .and_then(ColumnValue::as_text)?;
        let point = parse_point_descriptor(descriptor);
        if point.is_none() {
            debug!("point descriptor {descriptor:?} did not yield a point");
        }
        point.map(|geometry| (geometry, GeometrySource::PointDescriptor))
    }

    /// Extract a geometry from `row`, or `None` when every stage fails.
    #[must_use]
    pub fn extract(&self, row: &RawRow) -> Option<Geometry> {
        self.extract_with_source(row).map(|(geometry, _)| geometry)
    }
}

/// Parse structured geometry text held in a cell.
///
/// Only JSON objects count; bare scalars and arrays are not geometries.
fn parse_structured(value: &ColumnValue) -> Option<Geometry> {
    let parsed = match value {
        ColumnValue::Text(text) => serde_json::from_str::<Value>(text).ok()?,
        ColumnValue::Blob(bytes) => serde_json::from_slice::<Value>(bytes).ok()?,
        ColumnValue::Null | ColumnValue::Integer(_) | ColumnValue::Real(_) => return None,
    };
    if parsed.is_object() {
        Geometry::from_value(parsed)
    } else {
        None
    }
}

/// Recover a point from a `POINT [Z] (x y [z])` descriptor.
///
/// At least two numbers are required; a third becomes the `z` ordinate and
/// any further numbers are ignored. Any unparseable token yields `None`, as
/// does `POINT` inside a longer keyword such as `MULTIPOINT`.
///
/// # Examples
/// ```
/// use blitzfind_data::ingest::parse_point_descriptor;
/// use serde_json::json;
///
/// let point = parse_point_descriptor("POINT Z (121.5 31.2 13.26)").expect("point");
/// assert_eq!(
///     point.as_value(),
///     &json!({"type": "Point", "coordinates": [121.5, 31.2, 13.26]})
/// );
/// assert!(parse_point_descriptor("LINESTRING (0 0, 1 1)").is_none());
/// ```
#[must_use]
pub fn parse_point_descriptor(text: &str) -> Option<Geometry> {
    let captures = POINT_DESCRIPTOR.as_ref()?.captures(text)?;
    let numbers = captures
        .get(1)?
        .as_str()
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match numbers.as_slice() {
        [x, y] => Geometry::point(*x, *y, None),
        [x, y, z, ..] => Geometry::point(*x, *y, Some(*z)),
        _ => None,
    }
}
