//! Subcommand implementations.

pub mod health;
pub mod orders;
pub mod quote;
pub mod settings;

use std::time::Duration;

use printloom_api::{ApiClient, ApiConfig, ApiError};
use printloom_core::PricingError;
use thiserror::Error;
use url::Url;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Pricing input out of range.
    #[error("Invalid price input: {0}")]
    Pricing(#[from] PricingError),

    /// A command argument could not be used.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The account signed in but is not an admin.
    #[error("{0} is not an admin account")]
    NotAdmin(String),
}

/// A backend client without caching; every command wants fresh data.
pub(crate) fn client(backend_url: &Url) -> Result<ApiClient, CliError> {
    let config = ApiConfig::new(backend_url.clone())
        .with_timeout(Duration::from_secs(10))
        .with_cache_ttl(Duration::ZERO);
    Ok(ApiClient::new(&config)?)
}
