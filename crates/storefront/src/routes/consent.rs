//! Cookie banner answer.

use axum::{
    Form,
    extract::State,
    http::{HeaderValue, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::routes::safe_redirect;
use crate::state::AppState;

/// Name of the cookie that records the shopper's answer.
pub const CONSENT_COOKIE: &str = "pl_cookie_consent";

/// How long the answer is remembered.
const CONSENT_MAX_AGE_DAYS: i64 = 365;

/// Banner form data.
#[derive(Debug, Deserialize)]
pub struct ConsentForm {
    #[serde(default)]
    pub choice: String,
    pub next: Option<String>,
}

/// Cookie value for a banner choice. Anything but "accept" is a decline.
fn consent_value(choice: &str) -> &'static str {
    if choice.eq_ignore_ascii_case("accept") {
        "accepted"
    } else {
        "declined"
    }
}

fn consent_cookie(value: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((CONSENT_COOKIE, value))
        .path("/")
        .max_age(Duration::days(CONSENT_MAX_AGE_DAYS))
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Record the answer and return to the page the banner was on.
pub async fn set_consent(State(state): State<AppState>, Form(form): Form<ConsentForm>) -> Response {
    let cookie = consent_cookie(consent_value(&form.choice), state.config().is_secure());
    let mut response = Redirect::to(&safe_redirect(form.next.as_deref(), "/")).into_response();

    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Invalid consent cookie: {}", e),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_value() {
        assert_eq!(consent_value("accept"), "accepted");
        assert_eq!(consent_value("ACCEPT"), "accepted");
        assert_eq!(consent_value("decline"), "declined");
        assert_eq!(consent_value(""), "declined");
    }

    #[test]
    fn test_consent_cookie_attributes() {
        let header = consent_cookie("accepted", true).to_string();
        assert!(header.starts_with("pl_cookie_consent=accepted"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=31536000"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Secure"));

        let insecure = consent_cookie("declined", false).to_string();
        assert!(!insecure.contains("Secure"));
    }
}
