//! Normalization of raw catalog records into a stable product shape.
//!
//! Field names on the external table are inconsistent (locale suffixes,
//! team suffixes, historical renames), and any field may be absent. Every
//! resolution here walks an ordered alias chain and terminates in a
//! literal default, so normalization can never fail for any input.

use serde::Serialize;

use crate::fields::{first_present, FieldValue, Record};
use crate::pricing::format_price;

const NAME_EN_ALIASES: &[&str] = &["Name | EN", "Product name | EN", "Name"];
const NAME_DE_ALIASES: &[&str] = &["Name | DE", "Produktname | DE", "Name"];
const DEFAULT_NAME_EN: &str = "Product";
const DEFAULT_NAME_DE: &str = "Produkt";

const SAMPLE_PRICE_ALIASES: &[&str] = &["1-24 pcs (Sample) | SALES", "1-24 pcs (Sample)"];
const BULK_PRICE_ALIASES: &[&str] = &["1000+ pcs | SALES", "1000+ pcs"];
const GENERIC_PRICE_FIELD: &str = "Price";
const WEB_PRICE_FIELD: &str = "Web price";
const DEFAULT_PRICE: &str = "From €1";

const IMAGE_FIELD: &str = "Images";
const CATEGORY_FIELD: &str = "Category";

/// Which tier's alias list drives the displayed "From" price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTier {
    Sample,
    Bulk,
}

/// A catalog record resolved into an always-populated display shape.
///
/// Recomputed on every fetch and never persisted; its only identity is the
/// source record's `id`.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedProduct {
    pub id: String,
    pub name_en: String,
    pub name_de: String,
    pub price: String,
    pub image_full: Option<String>,
    pub image_large: Option<String>,
    pub image_small: Option<String>,
    pub categories: Vec<String>,
}

impl NormalizedProduct {
    /// Preferred display image: large thumbnail, then small, then the
    /// full-resolution original.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_large
            .as_deref()
            .or(self.image_small.as_deref())
            .or(self.image_full.as_deref())
    }
}

/// Resolves a raw record into a [`NormalizedProduct`]. Infallible: every
/// missing or malformed field degrades to its documented default.
#[must_use]
pub fn normalize(record: &Record, tier: DisplayTier) -> NormalizedProduct {
    let fields = &record.fields;

    let name_en =
        resolve_text(fields, NAME_EN_ALIASES).unwrap_or_else(|| DEFAULT_NAME_EN.to_string());
    let name_de =
        resolve_text(fields, NAME_DE_ALIASES).unwrap_or_else(|| DEFAULT_NAME_DE.to_string());

    let (image_full, image_large, image_small) = resolve_images(fields);

    NormalizedProduct {
        id: record.id.clone(),
        name_en,
        name_de,
        price: resolve_price(fields, tier),
        image_full,
        image_large,
        image_small,
        categories: resolve_categories(fields),
    }
}

fn resolve_text(fields: &crate::fields::Fields, aliases: &[&str]) -> Option<String> {
    first_present(fields, aliases)
        .and_then(FieldValue::as_str)
        .map(ToOwned::to_owned)
}

/// Display price: tier-specific alias list, then the generic price field,
/// then the web-price field, then a hardcoded minimum.
fn resolve_price(fields: &crate::fields::Fields, tier: DisplayTier) -> String {
    let tier_aliases = match tier {
        DisplayTier::Sample => SAMPLE_PRICE_ALIASES,
        DisplayTier::Bulk => BULK_PRICE_ALIASES,
    };

    let value = first_present(fields, tier_aliases)
        .or_else(|| fields.get(GENERIC_PRICE_FIELD))
        .or_else(|| fields.get(WEB_PRICE_FIELD));

    match value {
        Some(FieldValue::Number(n)) => format!("From {}", format_price(*n)),
        Some(FieldValue::Text(s)) if s.trim_start().starts_with('€') => s.clone(),
        Some(FieldValue::Text(s)) => format!("From €{s}"),
        _ => DEFAULT_PRICE.to_string(),
    }
}

/// Image URLs from the first attachment of the image field, each variant
/// independently nullable.
fn resolve_images(
    fields: &crate::fields::Fields,
) -> (Option<String>, Option<String>, Option<String>) {
    let first = fields
        .get(IMAGE_FIELD)
        .and_then(FieldValue::as_attachments)
        .and_then(<[_]>::first);

    let Some(attachment) = first else {
        return (None, None, None);
    };

    let thumbs = attachment.thumbnails.as_ref();
    let large = thumbs
        .and_then(|t| t.large.as_ref())
        .map(|t| t.url.clone());
    let small = thumbs
        .and_then(|t| t.small.as_ref())
        .map(|t| t.url.clone());

    (Some(attachment.url.clone()), large, small)
}

/// Flattens all string entries of the category field; non-strings are
/// dropped silently.
fn resolve_categories(fields: &crate::fields::Fields) -> Vec<String> {
    match fields.get(CATEGORY_FIELD) {
        Some(FieldValue::Text(s)) => vec![s.clone()],
        Some(FieldValue::Items(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(ToOwned::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}
