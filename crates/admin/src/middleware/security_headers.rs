//! Security headers middleware.
//!
//! Stricter than the storefront: no third-party scripts or frames at all.

use axum::{
    extract::{Request, State},
    http::{
        HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Build the admin CSP. Product images may come from the backend.
#[must_use]
pub fn content_security_policy(backend_origin: &str) -> String {
    format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         img-src 'self' {backend_origin} data: https:; \
         connect-src 'self'; \
         form-action 'self'; \
         base-uri 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Admin pages hold customer data, so responses are never cached.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let backend_origin = state.config().api_url.origin().ascii_serialization();
    match HeaderValue::from_str(&content_security_policy(&backend_origin)) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!("Invalid CSP header: {}", e),
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_csp_has_no_third_parties() {
        let csp = content_security_policy("http://localhost:4000");
        assert!(csp.contains("script-src 'self';"));
        assert!(csp.contains("img-src 'self' http://localhost:4000"));
        assert!(!csp.contains("stripe"));
    }
}
