//! Client for the Printloom REST backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for users, products, carts, orders,
//!   change requests, payments and settings. Nothing is stored locally.
//! - Every call goes through [`ApiClient::request`], which sends JSON, decodes
//!   JSON and maps HTTP failures onto [`ApiError`].
//! - The backend authenticates with a cookie. [`ApiClient::login`] captures it
//!   as a [`BackendSession`] that callers keep in their own session store and
//!   pass back on each authenticated call.
//! - Public catalog reads and settings are cached in memory via `moka`.
//! - Calls made inside [`with_request_id`] carry that ID in `x-request-id`,
//!   so backend logs line up with the web app's.
//!
//! # Example
//!
//! ```rust,ignore
//! use printloom_api::{ApiClient, ApiConfig};
//!
//! let client = ApiClient::new(&ApiConfig::new(url))?;
//!
//! let (user, session) = client.login("ada@example.com", "hunter22").await?;
//! let cart = client.get_cart(&session).await?;
//! let settings = client.get_settings().await?;
//! let totals = cart.totals(&settings);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod auth;
mod cache;
mod cart;
mod change_requests;
mod client;
mod config;
mod favorites;
mod orders;
mod payments;
mod products;
mod settings;
pub mod types;
mod upload;
mod users;

pub use client::{ApiClient, BackendSession, REQUEST_ID_HEADER, with_request_id};
pub use config::ApiConfig;
pub use reqwest::Method;
pub use types::*;
pub use upload::{ImageUpload, MAX_UPLOAD_BYTES};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend did not answer within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The call needs a signed-in user (HTTP 401).
    #[error("Not authenticated")]
    Unauthorized,

    /// The resource does not exist (HTTP 404).
    #[error("Not found")]
    NotFound,

    /// The backend rejected the request.
    #[error("Backend error {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, or the status reason.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build the error for a non-success response.
    ///
    /// JSON bodies of the form `{"message": "..."}` or `{"error": "..."}`
    /// provide the message; otherwise the status reason is used.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => return Self::Unauthorized,
            StatusCode::NOT_FOUND => return Self::NotFound,
            _ => {}
        }

        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error"].iter().find_map(|key| {
                    value
                        .get(key)
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string)
                })
            })
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string()
            });

        Self::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// Message that can be shown to a shopper or admin.
    ///
    /// Backend validation messages pass through; transport details do not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "We couldn't reach the store right now. Please try again in a moment.".to_string()
            }
            Self::Timeout => "The store took too long to respond. Please try again.".to_string(),
            Self::Unauthorized => "Please sign in to continue.".to_string(),
            Self::NotFound => "That item could not be found.".to_string(),
            Self::Status { status, message } if *status < 500 => message.clone(),
            Self::Status { .. } | Self::Decode(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
        }
    }

    /// Whether the failure is on the backend or transport side rather than
    /// caused by the request.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout | Self::Decode(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Unauthorized | Self::NotFound => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for backend calls.
pub type Result<T> = std::result::Result<T, ApiError>;
