//! Security headers middleware.
//!
//! Locked down by default. The Content-Security-Policy opens exactly what
//! checkout needs: Stripe.js and its frames, the Stripe API, and product
//! images served by the backend.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;
use crate::state::AppState;

/// Build the CSP for one response.
///
/// ```text
/// default-src 'none';
/// script-src 'self' 'nonce-…' https://js.stripe.com;
/// style-src 'self';
/// img-src 'self' <backend origin> data: https:;
/// connect-src 'self' https://api.stripe.com;
/// frame-src https://js.stripe.com https://hooks.stripe.com;
/// ...
/// ```
#[must_use]
pub fn content_security_policy(nonce: &str, backend_origin: &str) -> String {
    let script_nonce = if nonce.is_empty() {
        String::new()
    } else {
        format!(" 'nonce-{nonce}'")
    };

    format!(
        "default-src 'none'; \
         script-src 'self'{script_nonce} https://js.stripe.com; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' {backend_origin} data: https:; \
         connect-src 'self' https://api.stripe.com; \
         frame-src https://js.stripe.com https://hooks.stripe.com; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: same-origin` - Keep the referer for post-login returns
/// - `Content-Security-Policy` - See [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features except `payment`
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    let backend_origin = state.config().backend.api_url.origin().ascii_serialization();
    match HeaderValue::from_str(&content_security_policy(&nonce, &backend_origin)) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!("Invalid CSP header: {}", e),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             geolocation=(), \
             microphone=(), \
             usb=(), \
             payment=(self \"https://js.stripe.com\")",
        ),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_stripe_and_backend_images() {
        let csp = content_security_policy("abc123", "https://api.printloom.example");
        assert!(csp.contains("script-src 'self' 'nonce-abc123' https://js.stripe.com"));
        assert!(csp.contains("img-src 'self' https://api.printloom.example"));
        assert!(csp.contains("frame-src https://js.stripe.com https://hooks.stripe.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_csp_without_nonce() {
        let csp = content_security_policy("", "http://localhost:4000");
        assert!(csp.contains("script-src 'self' https://js.stripe.com"));
        assert!(!csp.contains("nonce-"));
    }
}
