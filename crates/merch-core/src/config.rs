use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
///
/// The two Airtable secrets are optional at load time: the server starts
/// without them and the catalog/quote routes report the missing
/// configuration per request.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("MERCH_ENV", "development"));
    let bind_addr = parse_addr("MERCH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("MERCH_LOG_LEVEL", "info");

    let airtable_api_token = lookup("AIRTABLE_API_TOKEN").ok().filter(|s| !s.is_empty());
    let airtable_products_url = lookup("AIRTABLE_PRODUCTS_URL")
        .ok()
        .filter(|s| !s.is_empty());

    let gateway_timeout_ms = parse_u64("MERCH_GATEWAY_TIMEOUT_MS", "8000")?;
    let gateway_max_retries = parse_u32("MERCH_GATEWAY_MAX_RETRIES", "2")?;
    let gateway_backoff_base_ms = parse_u64("MERCH_GATEWAY_BACKOFF_BASE_MS", "250")?;
    let gateway_revalidate_secs = parse_u64("MERCH_GATEWAY_REVALIDATE_SECS", "300")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        airtable_api_token,
        airtable_products_url,
        gateway_timeout_ms,
        gateway_max_retries,
        gateway_backoff_base_ms,
        gateway_revalidate_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
