//! Canonical feature model shared by the import pipeline and the store.
//!
//! A [`Feature`] is the normalised form of every imported record: an
//! identifier, an optional geometry, and an ordered property bag. Geometry is
//! kept as GeoJSON-shaped JSON and is never validated beyond the shape checks
//! needed to read coordinates back out.

use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Ordered property bag attached to a [`Feature`].
///
/// Insertion order follows the source column order. It is preserved for
/// readability only and carries no meaning.
pub type Properties = Map<String, Value>;

/// Non-empty identifier used as the store key for a feature.
///
/// # Examples
///
/// ```
/// use blitzfind_core::FeatureId;
///
/// # fn main() -> Result<(), blitzfind_core::FeatureIdError> {
/// let id = FeatureId::new("BLD001")?;
/// assert_eq!(id.as_str(), "BLD001");
/// assert!(FeatureId::new("").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureId(String);

/// Errors returned by [`FeatureId::new`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeatureIdError {
    /// The identifier was the empty string.
    #[error("feature identifier must not be empty")]
    Empty,
}

impl FeatureId {
    /// Validates and constructs a [`FeatureId`].
    pub fn new(id: impl Into<String>) -> Result<Self, FeatureIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(FeatureIdError::Empty);
        }
        Ok(Self(id))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FeatureId {
    type Error = FeatureIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.0
    }
}

/// GeoJSON-shaped geometry carried opaquely.
///
/// Any non-null JSON value is accepted: ring closure, coordinate ranges and
/// even the `type` member are not checked. The only geometry the crate builds
/// itself is a [`Geometry::point`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geometry(Value);

impl Geometry {
    /// Wrap a JSON value, treating `null` as "no geometry".
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        (!value.is_null()).then_some(Self(value))
    }

    /// Build a `Point` geometry with an optional third ordinate.
    ///
    /// Returns `None` when any ordinate is not finite, as JSON cannot carry it.
    ///
    /// # Examples
    ///
    /// ```
    /// use blitzfind_core::Geometry;
    /// use serde_json::json;
    ///
    /// let point = Geometry::point(121.5, 31.2, Some(13.26)).expect("finite ordinates");
    /// assert_eq!(
    ///     point.as_value(),
    ///     &json!({"type": "Point", "coordinates": [121.5, 31.2, 13.26]})
    /// );
    /// ```
    #[must_use]
    pub fn point(x: f64, y: f64, z: Option<f64>) -> Option<Self> {
        let mut position = Vec::with_capacity(3);
        for ordinate in [Some(x), Some(y), z].into_iter().flatten() {
            position.push(Value::from(serde_json::Number::from_f64(ordinate)?));
        }
        let mut object = Map::new();
        object.insert("type".into(), Value::from("Point"));
        object.insert("coordinates".into(), Value::Array(position));
        Some(Self(Value::Object(object)))
    }

    /// The GeoJSON `type` member, when present and a string.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Borrow the raw JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the geometry, returning the raw JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Collect every finite two-dimensional position found in the geometry.
    ///
    /// Positions are arrays whose first two entries are numbers; they are
    /// discovered under `coordinates` at any nesting depth and inside the
    /// members of a `geometries` array. Anything else is ignored.
    #[must_use]
    pub fn positions(&self) -> Vec<Coord<f64>> {
        let mut positions = Vec::new();
        collect_geometry_positions(&self.0, &mut positions);
        positions
    }
}

fn collect_geometry_positions(value: &Value, out: &mut Vec<Coord<f64>>) {
    if let Some(coordinates) = value.get("coordinates") {
        collect_positions(coordinates, out);
    }
    if let Some(Value::Array(members)) = value.get("geometries") {
        for member in members {
            collect_geometry_positions(member, out);
        }
    }
}

fn collect_positions(value: &Value, out: &mut Vec<Coord<f64>>) {
    let Value::Array(items) = value else {
        return;
    };
    let mut ordinates = items.iter().map(Value::as_f64);
    if let (Some(Some(x)), Some(Some(y))) = (ordinates.next(), ordinates.next()) {
        if x.is_finite() && y.is_finite() {
            out.push(Coord { x, y });
        }
        return;
    }
    for item in items {
        collect_positions(item, out);
    }
}

/// Canonical record produced for every imported source unit.
///
/// Serialises as a GeoJSON `Feature` object.
///
/// # Examples
///
/// ```
/// use blitzfind_core::{Feature, FeatureId, Properties};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut properties = Properties::new();
/// properties.insert("name".into(), "Main hall".into());
/// let feature = Feature::new(FeatureId::new("BLD001")?, None, properties);
/// let json = serde_json::to_value(&feature)?;
/// assert_eq!(json["type"], "Feature");
/// assert_eq!(json["id"], "BLD001");
/// assert!(json["geometry"].is_null());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    /// Store key; never rewritten once assigned to a record.
    pub id: FeatureId,
    /// Geometry, or `None` when no extraction strategy produced one.
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// Property bag in source order.
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    /// Construct a feature from its parts.
    #[must_use]
    pub const fn new(id: FeatureId, geometry: Option<Geometry>, properties: Properties) -> Self {
        Self {
            id,
            geometry,
            properties,
        }
    }
}
