//! `POST /api/airtable-quote` — the submission pipeline.
//!
//! Accepts the contact form as JSON or as multipart form data with zero or
//! more `attachments` files. Steps, in order: gate every attachment
//! against the per-file size ceiling, map contact fields to external
//! column names, create the record, then upload attachments one at a time.
//! A failed upload fails the submission; the already-created record is
//! kept (no rollback) and the failure says so in the log.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Map, Value};

use merch_core::quote::QuoteFile;

use super::{error_response, error_with_details, upstream_error, AppState};
use crate::mapping::{map_contact_fields, ContactForm, ATTACHMENT_FIELD, MAX_ATTACHMENT_BYTES};

/// Ceiling for the JSON variant of the body; attachments only arrive via
/// multipart.
const JSON_BODY_LIMIT: usize = 2 * 1024 * 1024;

struct Submission {
    form: ContactForm,
    attachments: Vec<QuoteFile>,
}

pub async fn submit_quote(State(state): State<AppState>, req: Request) -> Response {
    let submission = match parse_submission(req).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    // Size gate runs before any outbound call.
    if let Some(file) = submission
        .attachments
        .iter()
        .find(|f| f.size() > MAX_ATTACHMENT_BYTES)
    {
        return error_with_details(
            StatusCode::PAYLOAD_TOO_LARGE,
            "attachment too large",
            &format!(
                "{} exceeds the {MAX_ATTACHMENT_BYTES} byte per-file limit",
                file.filename
            ),
        );
    }

    let Some(client) = state.client.as_ref() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Airtable configuration is missing",
        );
    };

    let fields = map_contact_fields(&submission.form);
    let created = match client.create_record(Value::Object(fields)).await {
        Ok(created) => created,
        Err(error) => return upstream_error("failed to create quote record", &error),
    };

    for file in &submission.attachments {
        if let Err(error) = client
            .upload_attachment(
                &created.id,
                ATTACHMENT_FIELD,
                &file.filename,
                &file.content_type,
                &file.data,
            )
            .await
        {
            tracing::error!(
                record_id = %created.id,
                file = %file.filename,
                error = %error,
                "attachment upload failed; the created record is kept without rollback"
            );
            return upstream_error("attachment upload failed", &error);
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "recordId": created.id,
            "data": created.fields,
        })),
    )
        .into_response()
}

/// Reads the request as either a JSON contact form or multipart form data.
async fn parse_submission(req: Request) -> Result<Submission, Response> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &()).await.map_err(|e| {
            error_with_details(
                StatusCode::BAD_REQUEST,
                "invalid multipart body",
                &e.to_string(),
            )
        })?;
        parse_multipart(multipart).await
    } else {
        let bytes = axum::body::to_bytes(req.into_body(), JSON_BODY_LIMIT)
            .await
            .map_err(|e| {
                error_with_details(StatusCode::BAD_REQUEST, "unreadable body", &e.to_string())
            })?;
        let form: ContactForm = serde_json::from_slice(&bytes).map_err(|e| {
            error_with_details(StatusCode::BAD_REQUEST, "invalid JSON body", &e.to_string())
        })?;
        Ok(Submission {
            form,
            attachments: Vec::new(),
        })
    }
}

async fn parse_multipart(mut multipart: Multipart) -> Result<Submission, Response> {
    let mut values = Map::new();
    let mut attachments = Vec::new();

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            error_with_details(
                StatusCode::BAD_REQUEST,
                "invalid multipart body",
                &e.to_string(),
            )
        })?;
        let Some(field) = field else { break };
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        if name == "attachments" {
            let filename = field
                .file_name()
                .unwrap_or("attachment")
                .to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| {
                    error_with_details(
                        StatusCode::BAD_REQUEST,
                        "unreadable attachment",
                        &e.to_string(),
                    )
                })?
                .to_vec();
            attachments.push(QuoteFile {
                filename,
                content_type,
                data,
            });
        } else {
            let text = field.text().await.map_err(|e| {
                error_with_details(
                    StatusCode::BAD_REQUEST,
                    "unreadable form field",
                    &e.to_string(),
                )
            })?;
            let value = coerce_form_value(&name, text);
            values.insert(name, value);
        }
    }

    let form: ContactForm = serde_json::from_value(Value::Object(values)).map_err(|e| {
        error_with_details(
            StatusCode::BAD_REQUEST,
            "invalid form fields",
            &e.to_string(),
        )
    })?;

    Ok(Submission { form, attachments })
}

/// Multipart text fields arrive untyped; the two non-string form fields
/// are coerced here so the form deserializes the same way as JSON.
#[allow(clippy::cast_possible_truncation)]
fn coerce_form_value(name: &str, text: String) -> Value {
    match name {
        "quantity" => text
            .trim()
            .parse::<f64>()
            .map_or(Value::Null, |n| Value::from(n.trunc() as i64)),
        "sameBillingAddress" => match text.trim() {
            "true" | "on" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::Null,
        },
        _ => Value::from(text),
    }
}
