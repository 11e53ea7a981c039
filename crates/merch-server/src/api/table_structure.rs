//! `GET /api/airtable-table-structure` — development-only diagnostic that
//! infers the table's field structure from a sample record. Not part of
//! the production contract; the route answers 404 outside development.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use merch_airtable::ListParams;
use merch_core::fields::FieldValue;
use merch_core::Environment;

use super::{error_response, upstream_error, AppState};

pub async fn table_structure(State(state): State<AppState>) -> Response {
    if state.config.env != Environment::Development {
        return error_response(StatusCode::NOT_FOUND, "not found");
    }

    let Some(client) = state.client.as_ref() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Airtable configuration is missing",
        );
    };

    let params = ListParams {
        max_records: Some(1),
        ..ListParams::default()
    };
    match client.list_records(&params).await {
        Ok(page) => {
            let inferred: BTreeMap<&String, &'static str> = page
                .records
                .first()
                .map(|record| {
                    record
                        .fields
                        .iter()
                        .map(|(name, value)| (name, field_type_name(value)))
                        .collect()
                })
                .unwrap_or_default();

            Json(json!({
                "table": client.endpoint().table_id(),
                "fields": inferred,
            }))
            .into_response()
        }
        Err(error) => upstream_error("failed to sample table structure", &error),
    }
}

fn field_type_name(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Bool(_) => "boolean",
        FieldValue::Number(_) => "number",
        FieldValue::Text(_) => "string",
        FieldValue::Attachments(_) => "attachments",
        FieldValue::Items(_) => "list",
        FieldValue::Other(_) => "unknown",
    }
}
