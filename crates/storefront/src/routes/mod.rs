//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (offers carousel, newest products)
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (backend reachable)
//!
//! # Catalog
//! GET  /products               - Search, filter, sort, paginate
//! GET  /products/{id}          - Product detail with customization form
//!
//! # Cart (signed-in)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add item (multipart, optional image)
//! POST /cart/update            - Set quantity (0 removes)
//! POST /cart/remove            - Remove item
//!
//! # Checkout (signed-in)
//! GET  /checkout               - Shipping form + summary
//! POST /checkout               - Place order, render card payment page
//! GET  /checkout/complete      - Payment return page
//!
//! # Favorites (signed-in)
//! GET  /favorites
//! POST /favorites/{id}
//! POST /favorites/{id}/remove
//!
//! # Account (signed-in)
//! GET  /account                - Profile, password, recent orders
//! POST /account/profile
//! POST /account/password
//! GET  /account/orders         - Order history
//! GET  /account/orders/{id}    - Order detail + change requests
//! GET  /account/orders/{id}/invoice
//! POST /account/orders/{id}/change-request
//! POST /account/orders/{id}/pay
//!
//! # Auth
//! GET  /auth/login, POST /auth/login
//! GET  /auth/register, POST /auth/register
//! POST /auth/logout
//!
//! POST /cookie-consent
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod consent;
pub mod favorites;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderMap, header::REFERER},
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Body limit for routes that accept an image upload.
const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

/// Create the auth routes router.
///
/// Only credential submissions are rate limited; both share one bucket per
/// client IP.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route(
            "/add",
            post(cart::add).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/complete", get(checkout::complete))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route("/{id}", post(favorites::add))
        .route("/{id}/remove", post(favorites::remove))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/password", post(account::change_password))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order_detail))
        .route("/orders/{id}/invoice", get(account::invoice))
        .route(
            "/orders/{id}/change-request",
            post(account::request_change),
        )
        .route("/orders/{id}/pay", post(checkout::pay_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/cookie-consent", post(consent::set_consent))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/favorites", favorite_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}

// =============================================================================
// Redirect helpers
// =============================================================================

/// Validate a post-action redirect target.
///
/// Only local paths are accepted: they must start with `/` but not `//`
/// (protocol-relative) or `/\`, which browsers treat as another host.
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

/// The local path of the page a form was posted from.
#[must_use]
pub fn back_to(headers: &HeaderMap, fallback: &str) -> String {
    let referer = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|r| url::Url::parse(r).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        });
    safe_redirect(referer.as_deref(), fallback)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_safe_redirect_accepts_local_paths() {
        assert_eq!(safe_redirect(Some("/account/orders"), "/"), "/account/orders");
        assert_eq!(safe_redirect(Some("/products?page=2"), "/"), "/products?page=2");
    }

    #[test]
    fn test_safe_redirect_rejects_other_hosts() {
        assert_eq!(safe_redirect(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_redirect(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_redirect(Some("/\\evil.example"), "/"), "/");
        assert_eq!(safe_redirect(None, "/account"), "/account");
    }

    #[test]
    fn test_back_to_uses_referer_path() {
        let mut headers = HeaderMap::new();
        assert_eq!(back_to(&headers, "/favorites"), "/favorites");

        headers.insert(
            REFERER,
            HeaderValue::from_static("http://localhost:3000/products?category=mugs"),
        );
        assert_eq!(back_to(&headers, "/favorites"), "/products?category=mugs");
    }
}
