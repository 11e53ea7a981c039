//! Wire types for the tabular-data API.

use merch_core::fields::Record;
use serde::Deserialize;

/// Response to a list-records query: a page of records plus a pagination
/// offset when more pages exist.
#[derive(Debug, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub offset: Option<String>,
}

/// Response to record creation; only the id is needed downstream.
#[derive(Debug, Deserialize)]
pub struct CreatedRecord {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Value,
}
