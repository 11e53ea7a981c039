//! Record and field-value model for the external tabular-data API.
//!
//! The backend stores rows as a free-form map from field name to value.
//! Field names are inconsistent across locales and teams, and no field is
//! guaranteed to be present, so every consumer probes an ordered alias
//! chain and falls back to a documented default. [`FieldValue`] captures
//! the full range of value shapes as an untagged sum type instead of
//! dynamic property access.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row in the external store: an opaque id plus a field map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

/// Field map of a [`Record`]. `BTreeMap` keeps serialization deterministic.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single field value as returned by the external API.
///
/// Variant order matters for untagged deserialization: attachment arrays
/// are tried before the free-form `Items` catch-all so that an array of
/// attachment objects lands in [`FieldValue::Attachments`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Attachments(Vec<Attachment>),
    /// Any other array, e.g. multi-select labels.
    Items(Vec<serde_json::Value>),
    /// Catch-all for shapes the domain does not model (nested objects,
    /// collaborator fields); kept so record parsing never fails.
    Other(serde_json::Value),
}

impl FieldValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_attachments(&self) -> Option<&[Attachment]> {
        match self {
            FieldValue::Attachments(a) => Some(a),
            _ => None,
        }
    }
}

/// An uploaded file reference carried by an attachment field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
}

/// Pre-rendered thumbnail variants of an [`Attachment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<Thumbnail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<Thumbnail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Returns the value of the first alias present in `fields`.
#[must_use]
pub fn first_present<'a>(fields: &'a Fields, aliases: &[&str]) -> Option<&'a FieldValue> {
    aliases.iter().find_map(|name| fields.get(*name))
}
