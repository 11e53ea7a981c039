use thiserror::Error;

/// Errors returned by the tabular-data API gateway.
#[derive(Debug, Error)]
pub enum AirtableError {
    /// The configured endpoint URL is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Every attempt failed at the transport level (the request never
    /// completed), after the retry budget was exhausted.
    #[error("fetch failed after {attempts} attempts: {source}")]
    FetchFailed {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-2xx status. The raw body is kept for
    /// diagnostics and surfaced verbatim to the caller.
    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AirtableError {
    /// Upstream HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            AirtableError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
