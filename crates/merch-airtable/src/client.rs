//! HTTP client for the tabular-data API.
//!
//! All reads go through [`AirtableClient::fetch_with_retry`]: an
//! authenticated GET with a request-scoped timeout, retried only on 429
//! and 5xx with a linear backoff, returning non-retryable HTTP errors
//! as-is. Writes (record creation, attachment upload) are single-shot.

use std::time::Duration;

use base64::Engine as _;
use reqwest::{Client, StatusCode, Url};

use crate::endpoint::{Endpoint, ListParams};
use crate::error::AirtableError;
use crate::types::{CreatedRecord, ListRecordsResponse};
use merch_core::fields::Record;

const DEFAULT_CONTENT_HOST: &str = "content.airtable.com";

/// Per-request knobs for [`AirtableClient::fetch_with_retry`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout_ms: u64,
    /// Additional attempts after the first; retries apply only to 429/5xx
    /// responses and transport-level failures.
    pub retries: u32,
    pub backoff_base_ms: u64,
    /// Forwarded as a `Cache-Control: max-age` hint; no caching happens in
    /// this crate.
    pub revalidate_secs: Option<u64>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            retries: 2,
            backoff_base_ms: 250,
            revalidate_secs: None,
        }
    }
}

/// Client for the tabular-data API.
///
/// Holds the HTTP client, bearer token, and the endpoint parsed from the
/// configured list-records URL. Use [`AirtableClient::with_content_base`]
/// to point attachment uploads at a mock server in tests.
pub struct AirtableClient {
    http: Client,
    token: String,
    endpoint: Endpoint,
    content_base: Url,
    options: FetchOptions,
}

impl AirtableClient {
    /// Creates a client from the configured token and list-records URL.
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::Config`] if the endpoint URL is malformed
    /// or [`AirtableError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, products_url: &str, options: FetchOptions) -> Result<Self, AirtableError> {
        let endpoint = Endpoint::parse(products_url)?;
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("merch-backend/0.1 (catalog-gateway)")
            .build()?;

        let content_base = default_content_base(products_url)?;

        Ok(Self {
            http,
            token: token.to_owned(),
            endpoint,
            content_base,
            options,
        })
    }

    /// Overrides the attachment-upload base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::Config`] if `base` is not a valid URL.
    pub fn with_content_base(mut self, base: &str) -> Result<Self, AirtableError> {
        self.content_base = Url::parse(base)
            .map_err(|e| AirtableError::Config(format!("invalid content base URL '{base}': {e}")))?;
        Ok(self)
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Issues an authenticated GET with timeout, bounded retry, and an
    /// optional revalidation hint.
    ///
    /// Responses with status 429 or 5xx are retried while attempts remain,
    /// sleeping `backoff_base_ms × attempt` between attempts; any other
    /// response is returned as-is, success or not. Transport-level
    /// failures are retried the same way and, once exhausted, fail with
    /// [`AirtableError::FetchFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::FetchFailed`] when no attempt produced an
    /// HTTP response.
    pub async fn fetch_with_retry(
        &self,
        url: Url,
        options: &FetchOptions,
    ) -> Result<reqwest::Response, AirtableError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut request = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .timeout(Duration::from_millis(options.timeout_ms));
            if let Some(secs) = options.revalidate_secs {
                request = request.header("Cache-Control", format!("max-age={secs}"));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if retryable && attempt <= options.retries {
                        tracing::warn!(
                            attempt,
                            retries = options.retries,
                            status = status.as_u16(),
                            "transient upstream status, retrying after backoff"
                        );
                        backoff(options.backoff_base_ms, attempt).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(error) => {
                    if attempt <= options.retries {
                        tracing::warn!(
                            attempt,
                            retries = options.retries,
                            error = %error,
                            "transport failure, retrying after backoff"
                        );
                        backoff(options.backoff_base_ms, attempt).await;
                        continue;
                    }
                    return Err(AirtableError::FetchFailed {
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
    }

    /// Lists records with the given query knobs.
    ///
    /// # Errors
    ///
    /// - [`AirtableError::Api`] on a non-2xx response (status + raw body).
    /// - [`AirtableError::FetchFailed`] when every attempt failed at the
    ///   transport level.
    /// - [`AirtableError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn list_records(
        &self,
        params: &ListParams,
    ) -> Result<ListRecordsResponse, AirtableError> {
        let url = self.endpoint.list_url(params);
        let body = self.get_json(url).await?;
        serde_json::from_value(body).map_err(|e| AirtableError::Deserialize {
            context: "listRecords".to_string(),
            source: e,
        })
    }

    /// Lists records and returns the upstream body untouched, for
    /// passthrough responses that must not re-shape attachment objects.
    ///
    /// # Errors
    ///
    /// Same as [`AirtableClient::list_records`].
    pub async fn list_records_raw(
        &self,
        params: &ListParams,
    ) -> Result<serde_json::Value, AirtableError> {
        let url = self.endpoint.list_url(params);
        self.get_json(url).await
    }

    /// Fetches a single record by id.
    ///
    /// # Errors
    ///
    /// Same as [`AirtableClient::list_records`].
    pub async fn get_record(&self, record_id: &str) -> Result<Record, AirtableError> {
        let url = self.endpoint.record_url(record_id);
        let body = self.get_json(url).await?;
        serde_json::from_value(body).map_err(|e| AirtableError::Deserialize {
            context: format!("getRecord(id={record_id})"),
            source: e,
        })
    }

    /// Creates one record with the given field map and returns it.
    ///
    /// Single-shot: creation is not retried, so a timeout can never create
    /// two records.
    ///
    /// # Errors
    ///
    /// - [`AirtableError::Api`] on a non-2xx response (status + raw body).
    /// - [`AirtableError::Http`] on transport failure.
    /// - [`AirtableError::Deserialize`] if the body does not contain a
    ///   record id.
    pub async fn create_record(
        &self,
        fields: serde_json::Value,
    ) -> Result<CreatedRecord, AirtableError> {
        let url = self.endpoint.table_url();
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .timeout(Duration::from_millis(self.options.timeout_ms))
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;

        let body = Self::check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| AirtableError::Deserialize {
            context: "createRecord".to_string(),
            source: e,
        })
    }

    /// Uploads one attachment to a record- and field-scoped endpoint. The
    /// binary is base64-encoded into the JSON body.
    ///
    /// # Errors
    ///
    /// - [`AirtableError::Api`] on a non-2xx response (status + raw body).
    /// - [`AirtableError::Http`] on transport failure.
    pub async fn upload_attachment(
        &self,
        record_id: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), AirtableError> {
        let url = self.endpoint.upload_url(&self.content_base, record_id, field);
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .timeout(Duration::from_millis(self.options.timeout_ms))
            .json(&serde_json::json!({
                "contentType": content_type,
                "file": encoded,
                "filename": filename,
            }))
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// GET via [`AirtableClient::fetch_with_retry`] with the client's
    /// configured options, then parse the body as JSON.
    async fn get_json(&self, url: Url) -> Result<serde_json::Value, AirtableError> {
        let context = url.to_string();
        let response = self.fetch_with_retry(url, &self.options).await?;
        let body = Self::check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| AirtableError::Deserialize {
            context,
            source: e,
        })
    }

    /// Maps a non-2xx response to [`AirtableError::Api`], keeping the raw
    /// body for diagnostics; returns the body text otherwise.
    async fn check_status(response: reqwest::Response) -> Result<String, AirtableError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            Ok(body)
        } else {
            Err(AirtableError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Derives the attachment-upload base URL from the configured endpoint:
/// the production API host maps to the dedicated content host, anything
/// else (mock servers) keeps its own origin.
fn default_content_base(products_url: &str) -> Result<Url, AirtableError> {
    let mut url = Url::parse(products_url)
        .map_err(|e| AirtableError::Config(format!("invalid endpoint URL: {e}")))?;
    url.set_path("");
    url.set_query(None);
    if url.host_str() == Some("api.airtable.com") {
        url.set_host(Some(DEFAULT_CONTENT_HOST))
            .map_err(|e| AirtableError::Config(format!("invalid content host: {e}")))?;
    }
    Ok(url)
}

async fn backoff(base_ms: u64, attempt: u32) {
    let delay_ms = base_ms.saturating_mul(u64::from(attempt));
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_content_base_maps_production_host() {
        let base = default_content_base("https://api.airtable.com/v0/appX/tblY?view=Grid").unwrap();
        assert_eq!(base.as_str(), "https://content.airtable.com/");
    }

    #[test]
    fn default_content_base_keeps_other_origins() {
        let base = default_content_base("http://127.0.0.1:9999/v0/appX/tblY").unwrap();
        assert_eq!(base.as_str(), "http://127.0.0.1:9999/");
    }

    #[test]
    fn fetch_options_defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.timeout_ms, 8_000);
        assert_eq!(options.retries, 2);
        assert_eq!(options.backoff_base_ms, 250);
        assert!(options.revalidate_secs.is_none());
    }
}
