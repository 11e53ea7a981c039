//! Quantity-tiered price resolution.
//!
//! Unit prices live on the product record itself, one field per quantity
//! tier, with a couple of historical alias spellings per tier. The tier
//! table is fixed, ordered, and covers every quantity from 1 upward with
//! no gaps and no overlaps; the top tier is unbounded.

use crate::fields::{first_present, FieldValue, Fields};

/// Hard ceiling for any quote quantity.
pub const MAX_QUANTITY: u32 = 99_999;

/// A contiguous quantity range and the record fields that may carry its
/// unit price, probed in order.
pub struct QuantityTier {
    pub min: u32,
    pub max: u32,
    pub aliases: &'static [&'static str],
}

/// Fixed tier table. The first tier whose `[min, max]` contains the
/// requested quantity is authoritative.
pub const QUANTITY_TIERS: &[QuantityTier] = &[
    QuantityTier {
        min: 1,
        max: 24,
        aliases: &["1-24 pcs (Sample) | SALES", "1-24 pcs (Sample)", "1-24 pcs"],
    },
    QuantityTier {
        min: 25,
        max: 99,
        aliases: &["25-99 pcs | SALES", "25-99 pcs"],
    },
    QuantityTier {
        min: 100,
        max: 249,
        aliases: &["100-249 pcs | SALES", "100-249 pcs"],
    },
    QuantityTier {
        min: 250,
        max: 499,
        aliases: &["250-499 pcs | SALES", "250-499 pcs"],
    },
    QuantityTier {
        min: 500,
        max: 999,
        aliases: &["500-999 pcs | SALES", "500-999 pcs"],
    },
    QuantityTier {
        min: 1000,
        max: u32::MAX,
        aliases: &["1000+ pcs | SALES", "1000+ pcs"],
    },
];

const MOQ_ALIASES: &[&str] = &[
    "MOQ",
    "MOQ | SALES",
    "Minimum order quantity",
    "Min. order quantity",
];

/// Resolves the display unit price for `quantity` from the record fields.
///
/// Returns `None` when the quantity is below 1, no tier field is present,
/// or the field value cannot be parsed as a price.
#[must_use]
pub fn unit_price(quantity: u32, fields: &Fields) -> Option<String> {
    unit_price_amount(quantity, fields).map(format_price)
}

/// Resolves the display total (`unit × quantity`) for `quantity`.
#[must_use]
pub fn total_price(quantity: u32, fields: &Fields) -> Option<String> {
    let unit = unit_price_amount(quantity, fields)?;
    Some(format_price(unit * f64::from(quantity)))
}

/// Numeric unit price before display formatting.
#[must_use]
pub fn unit_price_amount(quantity: u32, fields: &Fields) -> Option<f64> {
    if quantity < 1 {
        return None;
    }
    let tier = QUANTITY_TIERS
        .iter()
        .find(|t| t.min <= quantity && quantity <= t.max)?;
    let value = first_present(fields, tier.aliases)?;
    parse_price_value(value)
}

/// Minimum order quantity derived from the record fields, floored at 1.
#[must_use]
pub fn min_quantity(fields: &Fields) -> u32 {
    let raw = first_present(fields, MOQ_ALIASES).and_then(parse_price_value);
    match raw {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(n) if n >= 1.0 => (n as u32).min(MAX_QUANTITY),
        _ => 1,
    }
}

/// Parses a field value as a price amount.
///
/// Numbers pass through. Strings are scanned first for a currency-prefixed
/// numeric pattern, then for any bare numeric run; a comma is accepted as
/// decimal separator. Anything else yields `None`.
fn parse_price_value(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => parse_price_str(s),
        _ => None,
    }
}

fn parse_price_str(s: &str) -> Option<f64> {
    if let Some(idx) = s.find('€') {
        if let Some(amount) = scan_number(&s[idx + '€'.len_utf8()..]) {
            return Some(amount);
        }
    }
    scan_number(s)
}

/// Extracts the first numeric run (digits with at most one `.`/`,`
/// separator) from `s`.
fn scan_number(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];

    let mut end = 0;
    let mut seen_separator = false;
    for c in rest.chars() {
        if c.is_ascii_digit() {
            end += c.len_utf8();
        } else if (c == '.' || c == ',') && !seen_separator {
            seen_separator = true;
            end += c.len_utf8();
        } else {
            break;
        }
    }

    let token = rest[..end].trim_end_matches(['.', ',']).replace(',', ".");
    token.parse::<f64>().ok()
}

/// Formats an amount for display: no decimals for integer amounts, exactly
/// one decimal otherwise, always `€`-prefixed.
#[must_use]
pub fn format_price(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("€{amount:.0}")
    } else {
        format!("€{amount:.1}")
    }
}
