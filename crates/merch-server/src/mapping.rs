//! Translation of the contact form into the external system's field map.
//!
//! Application-level field names map one-to-one onto the external table's
//! column names; absent or empty values are omitted entirely rather than
//! sent as `null` or `""`. Two enumerated fields are translated through
//! fixed lookup tables with deliberately different miss behavior: an
//! unmapped service label passes through unchanged while an unmapped
//! messenger label is dropped. That asymmetry matches the live table and
//! is preserved as-is, pending confirmation from the table owner.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Per-file ceiling on the contact-form path.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// External column receiving uploaded files.
pub const ATTACHMENT_FIELD: &str = "Attachments";

/// Internal service label → external enumerated option string.
const SERVICE_OPTIONS: &[(&str, &str)] = &[
    ("design", "Design & Artwork"),
    ("production", "Production"),
    ("branding", "Branding"),
    ("fulfillment", "Fulfillment & Shipping"),
    ("warehousing", "Warehousing"),
];

/// Internal messenger label → external enumerated option string.
const MESSENGER_OPTIONS: &[(&str, &str)] = &[
    ("whatsapp", "WhatsApp"),
    ("telegram", "Telegram"),
    ("signal", "Signal"),
    ("wechat", "WeChat"),
];

/// Contact details posted by the quote form. Every field is optional; the
/// mapping below decides what actually goes on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactForm {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub vat_number: Option<String>,
    pub delivery_date: Option<String>,
    pub same_billing_address: Option<bool>,
    /// Aggregate quantity across all quote items. Fractional input is
    /// truncated toward zero rather than rejected.
    #[serde(deserialize_with = "de_quantity")]
    pub quantity: Option<i64>,
    pub preferred_contact: Option<String>,
    /// Preferred messenger; translated, unmapped values are dropped.
    pub preferred_type: Option<String>,
    pub contact_handle: Option<String>,
    pub request_type: Option<String>,
    /// Selected service; translated, unmapped values pass through.
    pub services: Option<String>,
    pub description: Option<String>,
}

/// Builds the outgoing field map for record creation.
#[must_use]
pub fn map_contact_fields(form: &ContactForm) -> Map<String, Value> {
    let mut fields = Map::new();

    put_text(&mut fields, "Name", form.name.as_deref());
    put_text(&mut fields, "Surname", form.surname.as_deref());
    put_text(&mut fields, "Email", form.email.as_deref());
    put_text(&mut fields, "Phone", form.phone.as_deref());
    put_text(&mut fields, "Company", form.company.as_deref());
    put_text(&mut fields, "Street", form.street.as_deref());
    put_text(&mut fields, "City", form.city.as_deref());
    put_text(&mut fields, "ZIP", form.zip.as_deref());
    put_text(&mut fields, "Country", form.country.as_deref());
    put_text(&mut fields, "VAT Number", form.vat_number.as_deref());
    put_text(&mut fields, "Delivery Date", form.delivery_date.as_deref());

    if let Some(flag) = form.same_billing_address {
        fields.insert("Same Billing Address".to_string(), Value::Bool(flag));
    }

    // Non-positive aggregate quantities are omitted, never sent as zero.
    if let Some(quantity) = form.quantity.filter(|q| *q > 0) {
        fields.insert("Quantity".to_string(), Value::from(quantity));
    }

    put_text(
        &mut fields,
        "Preferred Contact",
        form.preferred_contact.as_deref(),
    );
    if let Some(messenger) = form
        .preferred_type
        .as_deref()
        .and_then(translate_messenger)
    {
        fields.insert("Preferred Type".to_string(), Value::from(messenger));
    }
    put_text(&mut fields, "Contact Handle", form.contact_handle.as_deref());
    put_text(&mut fields, "Request Type", form.request_type.as_deref());

    if let Some(service) = form.services.as_deref().filter(|s| !s.trim().is_empty()) {
        fields.insert(
            "Services".to_string(),
            Value::from(translate_service(service)),
        );
    }

    put_text(&mut fields, "Description", form.description.as_deref());

    fields
}

/// Maps an internal service label to the external option string; unknown
/// labels pass through unchanged.
#[must_use]
pub fn translate_service(label: &str) -> String {
    let needle = label.trim().to_lowercase();
    SERVICE_OPTIONS
        .iter()
        .find(|(internal, external)| *internal == needle || external.eq_ignore_ascii_case(label))
        .map_or_else(|| label.to_string(), |(_, external)| (*external).to_string())
}

/// Maps an internal messenger label to the external option string; unknown
/// labels yield `None` and the field is omitted.
#[must_use]
pub fn translate_messenger(label: &str) -> Option<String> {
    let needle = label.trim().to_lowercase();
    MESSENGER_OPTIONS
        .iter()
        .find(|(internal, external)| *internal == needle || external.eq_ignore_ascii_case(label))
        .map(|(_, external)| (*external).to_string())
}

#[allow(clippy::cast_possible_truncation)]
fn de_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|n| n.trunc() as i64))
}

fn put_text(fields: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(text) = value {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            fields.insert(key.to_string(), Value::from(trimmed));
        }
    }
}
