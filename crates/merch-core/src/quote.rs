//! The client-local quote builder: an ordered, index-addressed collection
//! of selected items.
//!
//! Indices are positions, not identities — removing item `k` renumbers
//! everything after `k`, and callers re-derive indices after any removal.
//! All mutation is single-threaded by contract (one UI session), so there
//! is no interior locking.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::fields::Fields;
use crate::pricing::{self, MAX_QUANTITY};

/// Longest accepted free-text description on a quote item.
pub const MAX_DESCRIPTION_CHARS: usize = 1500;

/// A file the customer attached to a quote item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl QuoteFile {
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One selected product with its customization choices.
///
/// `product_fields` snapshots the originating record's fields at add time
/// so prices can be recomputed later without refetching the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub selected_color: Option<String>,
    pub selected_customization: Option<String>,
    pub selected_placements: BTreeSet<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<QuoteFile>,
    pub product_fields: Fields,
}

impl QuoteItem {
    /// Minimum quantity derived from the snapshotted record fields.
    #[must_use]
    pub fn min_quantity(&self) -> u32 {
        pricing::min_quantity(&self.product_fields)
    }

    fn clamp_quantity(&self, requested: u32) -> u32 {
        requested.clamp(self.min_quantity(), MAX_QUANTITY)
    }
}

/// Insertion-ordered collection of [`QuoteItem`]s.
#[derive(Debug, Clone, Default)]
pub struct QuoteCart {
    items: Vec<QuoteItem>,
}

impl QuoteCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[QuoteItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item, clamping its quantity into `[MOQ, MAX_QUANTITY]`.
    pub fn add(&mut self, mut item: QuoteItem) {
        item.quantity = item.clamp_quantity(item.quantity);
        if let Some(description) = item.description.take() {
            item.description = Some(truncate_description(&description));
        }
        self.items.push(item);
    }

    /// Removes the item at `index`, shifting subsequent indices down.
    /// Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    /// Sets the quantity of the item at `index`, clamped into
    /// `[MOQ, MAX_QUANTITY]`. Out-of-range indices are a no-op.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) {
        if let Some(item) = self.items.get_mut(index) {
            item.quantity = item.clamp_quantity(quantity);
        }
    }

    /// Replaces the free-text description of the item at `index`,
    /// truncated to [`MAX_DESCRIPTION_CHARS`].
    pub fn update_description(&mut self, index: usize, description: Option<&str>) {
        if let Some(item) = self.items.get_mut(index) {
            item.description = description.map(truncate_description);
        }
    }

    /// Replaces the attached file of the item at `index`.
    pub fn update_file(&mut self, index: usize, file: Option<QuoteFile>) {
        if let Some(item) = self.items.get_mut(index) {
            item.file = file;
        }
    }

    /// Empties the cart (post-submission).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all item quantities, for the aggregate-quantity form field.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

fn truncate_description(s: &str) -> String {
    s.chars().take(MAX_DESCRIPTION_CHARS).collect()
}
