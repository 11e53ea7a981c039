use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use merch_airtable::ListParams;

use super::{error_response, AppState};

/// `GET /api/airtable-products` — passthrough of the external list query.
///
/// The upstream body is forwarded untouched so attachment metadata the
/// typed model does not know about survives for the UI.
pub async fn list_products(State(state): State<AppState>) -> Response {
    let Some(client) = state.client.as_ref() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Airtable configuration is missing",
        );
    };

    match client.list_records_raw(&ListParams::default()).await {
        Ok(body) => Json(body).into_response(),
        Err(error) => {
            tracing::error!(error = %error, "failed to fetch products");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to fetch products",
            )
        }
    }
}
