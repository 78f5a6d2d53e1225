//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (backend reachable)
//!
//! # Dashboard
//! GET  /                           - Counts, revenue, pending change requests
//!
//! # Auth (backend accounts with the admin role)
//! GET  /auth/login, POST /auth/login
//! POST /auth/logout
//!
//! # Products
//! GET  /products                   - Search, category filter, pagination
//! GET  /products/new               - Create form
//! POST /products                   - Create (multipart, optional image)
//! GET  /products/{id}/edit         - Edit form
//! POST /products/{id}              - Update (multipart, optional image)
//! POST /products/{id}/delete       - Delete
//!
//! # Orders
//! GET  /orders                     - Status filter, client search, pagination
//! GET  /orders/{id}                - Detail with totals and change requests
//! POST /orders/{id}/status         - Update status
//! GET  /orders/{id}/print          - Printable invoice
//!
//! # Customers
//! GET  /customers                  - Search, pagination
//! GET  /customers/{id}             - Profile and orders
//!
//! # Payments
//! GET  /payments                   - Status filter, pagination
//!
//! # Settings
//! GET  /settings, POST /settings   - Shipping, tax (percent), currency
//!
//! # Change requests
//! GET  /change-requests            - Status filter (pending by default)
//! POST /change-requests/{id}/approve
//! POST /change-requests/{id}/reject
//! ```

pub mod auth;
pub mod change_requests;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod settings;

use askama::Template;
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use printloom_api::ApiError;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Rows per page on every admin list.
pub const PER_PAGE: usize = 20;

/// Common list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: Option<usize>,
}

impl ListQuery {
    /// Trimmed search term, empty when absent.
    #[must_use]
    pub fn search(&self) -> &str {
        self.q.as_deref().map_or("", str::trim)
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

/// Render a template, answering 500 when rendering fails.
pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Keep going with an empty value when a secondary read fails, but let an
/// expired backend session through so the admin is sent to login.
pub fn or_default<T: Default>(result: std::result::Result<T, ApiError>, what: &str) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(ApiError::Unauthorized) => Err(AppError::Api(ApiError::Unauthorized)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load {what}");
            Ok(T::default())
        }
    }
}

/// Validate a post-action redirect target.
///
/// Only local paths are accepted: they must start with `/` but not `//` or
/// `/\`, which browsers treat as another host.
#[must_use]
pub fn safe_redirect(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(customers::router())
        .merge(payments::router())
        .merge(settings::router())
        .merge(change_requests::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_default_propagates_expired_session() {
        let result: std::result::Result<Vec<i32>, ApiError> = Err(ApiError::Unauthorized);
        assert!(matches!(
            or_default(result, "orders"),
            Err(AppError::Api(ApiError::Unauthorized))
        ));

        let result: std::result::Result<Vec<i32>, ApiError> = Err(ApiError::Timeout);
        assert!(matches!(or_default(result, "orders"), Ok(v) if v.is_empty()));
    }

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/orders/12"), "/"), "/orders/12");
        assert_eq!(safe_redirect(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_redirect(None, "/change-requests"), "/change-requests");
    }

    #[test]
    fn test_list_query_search_is_trimmed() {
        let query = ListQuery {
            q: Some("  ada ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(query.search(), "ada");
        assert_eq!(query.page(), 1);
    }
}
