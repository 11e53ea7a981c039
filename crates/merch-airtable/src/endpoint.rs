//! URL building from the single configured list-records endpoint.
//!
//! The deployment configures one URL of the form
//! `https://api.airtable.com/v0/{baseId}/{tableId}?view=...`. Base id and
//! table id are parsed out of the path; list queries reuse the configured
//! query parameters unless a parameter is explicitly overridden.

use reqwest::Url;

use crate::error::AirtableError;

/// Query knobs for a list-records call. Unset knobs leave the configured
/// endpoint's own query parameters untouched.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Field projection; sent as repeated `fields[]` parameters.
    pub fields: Vec<String>,
    pub view: Option<String>,
    pub page_size: Option<u32>,
    pub max_records: Option<u32>,
    pub filter_formula: Option<String>,
}

/// The configured endpoint decomposed into its addressing parts.
#[derive(Debug, Clone)]
pub struct Endpoint {
    list_url: Url,
    base_id: String,
    table_id: String,
}

impl Endpoint {
    /// Parses a configured list-records URL into its parts.
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::Config`] if the URL does not parse or its
    /// path does not contain `/v0/{baseId}/{tableId}`.
    pub fn parse(products_url: &str) -> Result<Self, AirtableError> {
        let url = Url::parse(products_url)
            .map_err(|e| AirtableError::Config(format!("invalid endpoint URL: {e}")))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let v0 = segments.iter().position(|s| *s == "v0").ok_or_else(|| {
            AirtableError::Config("endpoint path must contain a /v0/ segment".to_string())
        })?;
        let base_id = segments.get(v0 + 1).ok_or_else(|| {
            AirtableError::Config("endpoint path is missing the base id".to_string())
        })?;
        let table_id = segments.get(v0 + 2).ok_or_else(|| {
            AirtableError::Config("endpoint path is missing the table id".to_string())
        })?;

        Ok(Self {
            base_id: (*base_id).to_string(),
            table_id: (*table_id).to_string(),
            list_url: url,
        })
    }

    #[must_use]
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    #[must_use]
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// The list-records URL with `params` applied on top of the configured
    /// query. Configured parameters survive unless explicitly overridden.
    #[must_use]
    pub fn list_url(&self, params: &ListParams) -> Url {
        let mut overridden: Vec<&str> = Vec::new();
        if !params.fields.is_empty() {
            overridden.push("fields[]");
        }
        if params.view.is_some() {
            overridden.push("view");
        }
        if params.page_size.is_some() {
            overridden.push("pageSize");
        }
        if params.max_records.is_some() {
            overridden.push("maxRecords");
        }
        if params.filter_formula.is_some() {
            overridden.push("filterByFormula");
        }

        let kept: Vec<(String, String)> = self
            .list_url
            .query_pairs()
            .filter(|(k, _)| !overridden.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.list_url.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            for field in &params.fields {
                pairs.append_pair("fields[]", field);
            }
            if let Some(view) = &params.view {
                pairs.append_pair("view", view);
            }
            if let Some(page_size) = params.page_size {
                pairs.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(max_records) = params.max_records {
                pairs.append_pair("maxRecords", &max_records.to_string());
            }
            if let Some(formula) = &params.filter_formula {
                pairs.append_pair("filterByFormula", formula);
            }
        }
        url
    }

    /// URL of a single record: the table root plus the record id.
    #[must_use]
    pub fn record_url(&self, record_id: &str) -> Url {
        let mut url = self.table_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(record_id);
        }
        url
    }

    /// URL used for record creation: the table root without any query.
    #[must_use]
    pub fn table_url(&self) -> Url {
        let mut url = self.list_url.clone();
        url.set_query(None);
        url
    }

    /// Attachment-upload URL on `content_base`, scoped to one record and
    /// one field.
    #[must_use]
    pub fn upload_url(&self, content_base: &Url, record_id: &str, field: &str) -> Url {
        let mut url = content_base.clone();
        url.set_query(None);
        url.set_path("");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v0", &self.base_id, record_id, field, "uploadAttachment"]);
        }
        url
    }
}
