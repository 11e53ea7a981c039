//! Gateway to the external tabular-data API.
//!
//! Wraps `reqwest` with bearer-token auth, a request-scoped timeout,
//! bounded retry with linear backoff, and URL building from the single
//! configured list-records endpoint. No caching is performed here; callers
//! pass a revalidation hint that is forwarded as a `Cache-Control`
//! directive.

mod client;
mod endpoint;
mod error;
mod types;

pub use client::{AirtableClient, FetchOptions};
pub use endpoint::{Endpoint, ListParams};
pub use error::AirtableError;
pub use types::{CreatedRecord, ListRecordsResponse};
