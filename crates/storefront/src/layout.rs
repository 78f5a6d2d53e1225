//! Data every storefront page needs: navbar, toast and cookie banner.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use tower_sessions::{Session, cookie::Cookie};

use crate::flash::{Flash, take_flash};
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::consent::CONSENT_COOKIE;
use crate::state::AppState;

/// Page chrome shared by every full-page template.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Signed-in shopper's name, if any.
    pub user_name: Option<String>,
    /// Units in the cart, for the navbar badge.
    pub cart_count: u32,
    /// Toast queued by the previous action.
    pub flash: Option<Flash>,
    /// Whether the shopper has not yet answered the cookie banner.
    pub show_cookie_banner: bool,
    /// CSP nonce for inline scripts.
    pub nonce: String,
    /// Path and query of this page, for forms that return here.
    pub current_path: String,
}

impl Layout {
    /// Whether someone is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user_name.is_some()
    }
}

/// Whether the request carries an answer to the cookie banner.
fn has_consent_cookie(parts: &Parts) -> bool {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .any(|cookie| cookie.name() == CONSENT_COOKIE)
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalAuth(auth) = OptionalAuth::from_request_parts(parts, state).await?;

        let flash = match parts.extensions.get::<Session>() {
            Some(session) => take_flash(session).await,
            None => None,
        };

        // The navbar badge must not fail the page
        let cart_count = match &auth {
            Some(auth) => match state.api().get_cart(&auth.backend).await {
                Ok(cart) => cart.item_count(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch cart for navbar");
                    0
                }
            },
            None => 0,
        };

        Ok(Self {
            user_name: auth.map(|a| a.user.first_name().to_string()),
            cart_count,
            flash,
            show_cookie_banner: !has_consent_cookie(parts),
            nonce,
            current_path: parts
                .uri
                .path_and_query()
                .map_or_else(|| "/".to_string(), ToString::to_string),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_cookie(cookie: &str) -> Parts {
        Request::builder()
            .header(COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_consent_cookie_detected() {
        assert!(has_consent_cookie(&parts_with_cookie(
            "pl_session=abc; pl_cookie_consent=accepted"
        )));
        assert!(has_consent_cookie(&parts_with_cookie(
            "pl_cookie_consent=declined"
        )));
        assert!(!has_consent_cookie(&parts_with_cookie("pl_session=abc")));
    }
}
