//! Authentication extractors.
//!
//! The backend owns authentication; the storefront only remembers who signed
//! in and the backend cookie that proves it.

use axum::{
    extract::FromRequestParts,
    http::{Method, header::REFERER, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{AuthSession, session_keys};

/// Extractor that requires a signed-in shopper.
///
/// If nobody is signed in, redirects to the login page with a `next`
/// parameter pointing back to where the shopper was.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Rejection for [`RequireAuth`]: send the shopper to log in.
pub struct AuthRejection {
    next: Option<String>,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let target = self.next.map_or_else(
            || "/auth/login".to_string(),
            |next| format!("/auth/login?next={}", urlencoding::encode(&next)),
        );
        Redirect::to(&target).into_response()
    }
}

/// Where to come back to after logging in.
///
/// GET requests return to themselves. Form posts cannot be replayed, so
/// they return to the page the form was on.
fn return_path(parts: &Parts) -> Option<String> {
    if parts.method == Method::GET {
        return parts.uri.path_and_query().map(ToString::to_string);
    }

    parts
        .headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| url::Url::parse(referer).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        })
}

async fn session_auth(parts: &Parts) -> Option<AuthSession> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<AuthSession>(session_keys::AUTH)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_auth(parts).await {
            Some(auth) => Ok(Self(auth)),
            None => Err(AuthRejection {
                next: return_path(parts),
            }),
        }
    }
}

/// Extractor that optionally gets the signed-in shopper.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_auth(parts).await))
    }
}

/// Store the signed-in shopper in the session.
///
/// The session ID is rotated first so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::AUTH, auth).await
}

/// Forget the signed-in shopper (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<AuthSession>(session_keys::AUTH).await?;
    Ok(())
}
