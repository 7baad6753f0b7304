//! Typed view over one row returned by a relational source query.
#![forbid(unsafe_code)]

use base64::{Engine as _, engine::general_purpose};
use blitzfind_core::{FeatureId, Properties};
use rusqlite::types::ValueRef;
use serde_json::{Number, Value};

/// Owned copy of a single SQLite cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// SQL `NULL`.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// Double-precision float.
    Real(f64),
    /// Text, decoded lossily when the stored bytes are not UTF-8.
    Text(String),
    /// Opaque bytes, such as an extension-native geometry blob.
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for ColumnValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(int) => Self::Integer(int),
            ValueRef::Real(real) => Self::Real(real),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl ColumnValue {
    /// Borrow the value as text when it holds text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Coerce the value into an identifier string.
    ///
    /// Text is used as-is, numbers use their JSON decimal form (`1.0` stays
    /// `1.0`) and blobs are read as lossy UTF-8. `NULL` and empty results yield `None`.
    #[must_use]
    pub fn to_identifier(&self) -> Option<FeatureId> {
        let text = match self {
            Self::Null => return None,
            Self::Integer(int) => int.to_string(),
            Self::Real(real) => {
                Number::from_f64(*real).map_or_else(|| real.to_string(), |number| number.to_string())
            }
            Self::Text(text) => text.clone(),
            Self::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        FeatureId::new(text).ok()
    }

    /// Convert the value into a JSON property value.
    ///
    /// `NULL` and non-finite reals have no JSON form and yield `None`. Blobs
    /// become standard base64 strings.
    #[must_use]
    pub fn into_property(self) -> Option<Value> {
        match self {
            Self::Null => None,
            Self::Integer(int) => Some(Value::from(int)),
            Self::Real(real) => Number::from_f64(real).map(Value::Number),
            Self::Text(text) => Some(Value::String(text)),
            Self::Blob(bytes) => Some(Value::String(general_purpose::STANDARD.encode(bytes))),
        }
    }
}

/// One source row split into its reserved columns and the residual columns.
///
/// The identifier, the extension-rendered geometry alias and the raw geometry
/// column are held apart from the residual columns, which become the
/// feature's properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    identifier: Option<ColumnValue>,
    rendered_geometry: Option<ColumnValue>,
    raw_geometry: Option<ColumnValue>,
    columns: Vec<(String, ColumnValue)>,
}

impl RawRow {
    /// Start an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier column value.
    #[must_use]
    pub fn with_identifier(mut self, value: ColumnValue) -> Self {
        self.identifier = Some(value);
        self
    }

    /// Set the geometry rendered by the spatial extension.
    #[must_use]
    pub fn with_rendered_geometry(mut self, value: ColumnValue) -> Self {
        self.rendered_geometry = Some(value);
        self
    }

    /// Set the raw geometry column value.
    #[must_use]
    pub fn with_raw_geometry(mut self, value: ColumnValue) -> Self {
        self.raw_geometry = Some(value);
        self
    }

    /// Append a residual column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    /// Identifier derived from the identifier column, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<FeatureId> {
        self.identifier.as_ref().and_then(ColumnValue::to_identifier)
    }

    /// Geometry text produced by the spatial extension, when it was selected.
    #[must_use]
    pub const fn rendered_geometry(&self) -> Option<&ColumnValue> {
        self.rendered_geometry.as_ref()
    }

    /// Value of the geometry column as stored.
    #[must_use]
    pub const fn raw_geometry(&self) -> Option<&ColumnValue> {
        self.raw_geometry.as_ref()
    }

    /// Look up a residual column by name, ignoring ASCII case as SQLite does.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Residual columns converted into a property bag, in column order.
    ///
    /// Columns whose values have no JSON form (`NULL`, non-finite reals) are
    /// left out.
    #[must_use]
    pub fn into_properties(self) -> Properties {
        self.columns
            .into_iter()
            .filter_map(|(name, value)| value.into_property().map(|json| (name, json)))
            .collect()
    }
}
