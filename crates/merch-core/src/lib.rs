//! Domain logic for the merch catalog and quote builder: the heterogeneous
//! record-field model, quantity-tiered price resolution, record
//! normalization, the client-local quote cart, and app configuration.

mod app_config;
mod config;
pub mod fields;
pub mod normalize;
pub mod pricing;
pub mod quote;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
