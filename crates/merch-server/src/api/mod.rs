mod products;
mod quote;
mod table_structure;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use merch_airtable::{AirtableClient, AirtableError, FetchOptions};
use merch_core::AppConfig;

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState};

/// Body ceiling for the quote route; generous enough that the per-file
/// attachment gate is what rejects oversized uploads.
const QUOTE_BODY_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: Option<Arc<AirtableClient>>,
}

impl AppState {
    /// Builds the shared state, constructing the gateway client only when
    /// both secrets are configured. Routes that need the client answer 500
    /// until it exists.
    ///
    /// # Errors
    ///
    /// Fails if the configured endpoint URL is malformed or the HTTP
    /// client cannot be constructed.
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let client = match (&config.airtable_api_token, &config.airtable_products_url) {
            (Some(token), Some(url)) => {
                let options = FetchOptions {
                    timeout_ms: config.gateway_timeout_ms,
                    retries: config.gateway_max_retries,
                    backoff_base_ms: config.gateway_backoff_base_ms,
                    revalidate_secs: Some(config.gateway_revalidate_secs),
                };
                Some(Arc::new(AirtableClient::new(token, url, options)?))
            }
            _ => None,
        };
        Ok(Self { config, client })
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/airtable-products", get(products::list_products))
        .route(
            "/api/airtable-quote",
            post(quote::submit_quote).layer(DefaultBodyLimit::max(QUOTE_BODY_LIMIT)),
        )
        .route(
            "/api/airtable-table-structure",
            get(table_structure::table_structure),
        )
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[must_use]
pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

/// `{ "error": ... }` with the given status.
pub(super) fn error_response(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

/// `{ "error": ..., "details": ... }` with the given status.
pub(super) fn error_with_details(status: StatusCode, error: &str, details: &str) -> Response {
    (status, Json(json!({ "error": error, "details": details }))).into_response()
}

/// Maps a gateway error onto the inbound response: upstream HTTP errors
/// keep their status and raw body as details, everything else is a 500.
pub(super) fn upstream_error(error: &str, source: &AirtableError) -> Response {
    tracing::error!(error = %source, "{error}");
    match source {
        AirtableError::Api { status, body } => error_with_details(
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            error,
            body,
        ),
        other => error_with_details(StatusCode::INTERNAL_SERVER_ERROR, error, &other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use merch_core::Environment;
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(env: Environment) -> AppConfig {
        AppConfig {
            env,
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            log_level: "info".to_string(),
            airtable_api_token: Some("test-token".to_string()),
            airtable_products_url: None,
            gateway_timeout_ms: 5_000,
            gateway_max_retries: 0,
            gateway_backoff_base_ms: 0,
            gateway_revalidate_secs: 300,
        }
    }

    fn test_state(server_uri: &str, env: Environment) -> AppState {
        let products_url = format!("{server_uri}/v0/appT/tblQuotes?view=Grid");
        let client = AirtableClient::new(
            "test-token",
            &products_url,
            FetchOptions {
                timeout_ms: 5_000,
                retries: 0,
                backoff_base_ms: 0,
                revalidate_secs: None,
            },
        )
        .expect("client")
        .with_content_base(server_uri)
        .expect("content base");

        AppState {
            config: Arc::new(test_config(env)),
            client: Some(Arc::new(client)),
        }
    }

    fn unconfigured_state() -> AppState {
        AppState {
            config: Arc::new(test_config(Environment::Development)),
            client: None,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    /// Hand-rolled multipart body: contact fields plus one attachment.
    fn multipart_body(boundary: &str, attachment: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in [("email", "jo@example.com"), ("services", "design")] {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, data)) = attachment {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"attachments\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = build_app(unconfigured_state(), default_rate_limit_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"].as_str(), Some("ok"));
    }

    #[tokio::test]
    async fn products_return_500_without_configuration() {
        let app = build_app(unconfigured_state(), default_rate_limit_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/airtable-products")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn products_pass_upstream_records_through() {
        let server = MockServer::start().await;
        // Attachment keys the typed model does not know must survive the
        // passthrough untouched.
        Mock::given(method("GET"))
            .and(path("/v0/appT/tblQuotes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{
                    "id": "rec1",
                    "fields": {
                        "Name | EN": "Enamel Mug",
                        "Images": [{"url": "https://cdn.example.com/a.png", "size": 1234}]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let app = build_app(
            test_state(&server.uri(), Environment::Development),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/airtable-products")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["records"][0]["id"].as_str(), Some("rec1"));
        assert_eq!(
            json["records"][0]["fields"]["Images"][0]["size"].as_i64(),
            Some(1234)
        );
    }

    #[tokio::test]
    async fn products_surface_upstream_failure_as_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let app = build_app(
            test_state(&server.uri(), Environment::Development),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/airtable-products")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn quote_rejects_oversized_attachment_before_any_outbound_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let boundary = "merch-test-boundary";
        let oversized = vec![0u8; 6 * 1024 * 1024];
        let body = multipart_body(boundary, Some(("big-logo.png", &oversized)));

        let app = build_app(
            test_state(&server.uri(), Environment::Development),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/airtable-quote")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert!(
            json["details"]
                .as_str()
                .is_some_and(|d| d.contains("big-logo.png")),
            "details should name the offending file: {json}"
        );
        // Mock::expect(0) is verified when the server drops.
    }

    #[tokio::test]
    async fn quote_json_submission_creates_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v0/appT/tblQuotes"))
            .and(body_partial_json(serde_json::json!({
                "fields": {"Email": "jo@example.com", "Services": "Design & Artwork"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "recQ1",
                "fields": {"Email": "jo@example.com"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = build_app(
            test_state(&server.uri(), Environment::Development),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/airtable-quote")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"email": "jo@example.com", "services": "design", "quantity": 100}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"].as_bool(), Some(true));
        assert_eq!(json["recordId"].as_str(), Some("recQ1"));
    }

    #[tokio::test]
    async fn quote_multipart_submission_uploads_attachment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v0/appT/tblQuotes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "recQ2", "fields": {}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v0/appT/recQ2/Attachments/uploadAttachment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "att1"})))
            .expect(1)
            .mount(&server)
            .await;

        let boundary = "merch-test-boundary";
        let body = multipart_body(boundary, Some(("logo.png", b"png-bytes")));

        let app = build_app(
            test_state(&server.uri(), Environment::Development),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/airtable-quote")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["recordId"].as_str(), Some("recQ2"));
    }

    #[tokio::test]
    async fn quote_surfaces_upstream_validation_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("INVALID_VALUE_FOR_COLUMN"))
            .mount(&server)
            .await;

        let app = build_app(
            test_state(&server.uri(), Environment::Development),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/airtable-quote")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email": "jo@example.com"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert!(json["details"]
            .as_str()
            .is_some_and(|d| d.contains("INVALID_VALUE_FOR_COLUMN")));
    }

    #[tokio::test]
    async fn table_structure_is_hidden_outside_development() {
        let server = MockServer::start().await;
        let app = build_app(
            test_state(&server.uri(), Environment::Production),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/airtable-table-structure")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn table_structure_infers_field_types_in_development() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{
                    "id": "rec1",
                    "fields": {
                        "Name | EN": "Mug",
                        "MOQ": 25,
                        "Hidden": false,
                        "Images": [{"url": "https://cdn.example.com/a.png"}],
                        "Category": ["Drinkware"]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let app = build_app(
            test_state(&server.uri(), Environment::Development),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/airtable-table-structure")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["fields"]["Name | EN"].as_str(), Some("string"));
        assert_eq!(json["fields"]["MOQ"].as_str(), Some("number"));
        assert_eq!(json["fields"]["Hidden"].as_str(), Some("boolean"));
        assert_eq!(json["fields"]["Images"].as_str(), Some("attachments"));
        assert_eq!(json["fields"]["Category"].as_str(), Some("list"));
    }
}
