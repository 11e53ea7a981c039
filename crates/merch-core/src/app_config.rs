use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Bearer token for the external tabular-data API. Optional so the
    /// server can boot without it; routes that need it answer 500.
    pub airtable_api_token: Option<String>,
    /// Configured list-records endpoint; base id and table id are parsed
    /// from its path by the gateway crate.
    pub airtable_products_url: Option<String>,
    pub gateway_timeout_ms: u64,
    pub gateway_max_retries: u32,
    pub gateway_backoff_base_ms: u64,
    pub gateway_revalidate_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "airtable_api_token",
                &self.airtable_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("airtable_products_url", &self.airtable_products_url)
            .field("gateway_timeout_ms", &self.gateway_timeout_ms)
            .field("gateway_max_retries", &self.gateway_max_retries)
            .field("gateway_backoff_base_ms", &self.gateway_backoff_base_ms)
            .field("gateway_revalidate_secs", &self.gateway_revalidate_secs)
            .finish()
    }
}
