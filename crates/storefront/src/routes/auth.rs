//! Authentication route handlers.
//!
//! Credentials go straight to the backend; on success its cookie is kept in
//! the session and replayed on every call made for this shopper.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use printloom_api::{ApiError, NewUser, User};
use printloom_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::layout::Layout;
use crate::middleware::{OptionalAuth, clear_auth_session, set_auth_session};
use crate::models::{AuthSession, CurrentUser};
use crate::routes::safe_redirect;
use crate::state::AppState;

/// Shortest password accepted at registration or change.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns a user-facing message when the password is too short or the
/// confirmation does not match.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Passwords must be at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if password != confirm {
        return Err("The passwords do not match.".to_string());
    }
    Ok(())
}

// =============================================================================
// Forms
// =============================================================================

/// `?next=` on the login and register pages.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    pub next: Option<String>,
}

impl RegisterForm {
    /// Validate before calling the backend.
    ///
    /// # Errors
    ///
    /// Returns the first problem as a user-facing message.
    pub fn validate(&self) -> Result<NewUser, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name.".to_string());
        }
        let email = Email::from_form_input(&self.email).map_err(|e| e.to_string())?;
        validate_new_password(&self.password, &self.password_confirm)?;

        Ok(NewUser {
            name: name.to_string(),
            email: email.into_inner(),
            password: self.password.clone(),
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub next: String,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub next: String,
}

fn login_url(next: Option<&str>) -> String {
    match next {
        Some(next) if !next.is_empty() => {
            format!("/auth/login?next={}", urlencoding::encode(next))
        }
        _ => "/auth/login".to_string(),
    }
}

fn register_url(next: Option<&str>) -> String {
    match next {
        Some(next) if !next.is_empty() => {
            format!("/auth/register?next={}", urlencoding::encode(next))
        }
        _ => "/auth/register".to_string(),
    }
}

/// Remember the shopper and greet them.
async fn sign_in(
    session: &Session,
    user: &User,
    backend: printloom_api::BackendSession,
    greeting: String,
) -> Result<(), tower_sessions::session::Error> {
    let auth = AuthSession {
        user: CurrentUser::from(user),
        backend,
    };
    set_auth_session(session, &auth).await?;
    set_sentry_user(&user.id, Some(&user.email));
    set_flash(session, Flash::success(greeting)).await;
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    layout: Layout,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to(&safe_redirect(query.next.as_deref(), "/account")).into_response();
    }

    LoginTemplate {
        layout,
        next: safe_redirect(query.next.as_deref(), ""),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();

    match state.api().login(&email, &form.password).await {
        Ok((user, backend)) => {
            let greeting = format!("Welcome back, {}!", user.first_name());
            if let Err(e) = sign_in(&session, &user, backend, greeting).await {
                tracing::error!("Failed to set session: {}", e);
                set_flash(&session, Flash::error("Could not sign you in. Please try again."))
                    .await;
                return Redirect::to(&login_url(form.next.as_deref())).into_response();
            }
            tracing::info!(user_id = %user.id, "Customer logged in");
            Redirect::to(&safe_redirect(form.next.as_deref(), "/")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            let message = match e {
                ApiError::Unauthorized => "Invalid email or password.".to_string(),
                other => other.user_message(),
            };
            set_flash(&session, Flash::error(message)).await;
            Redirect::to(&login_url(form.next.as_deref())).into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(layout: Layout, Query(query): Query<NextQuery>) -> impl IntoResponse {
    RegisterTemplate {
        layout,
        next: safe_redirect(query.next.as_deref(), ""),
    }
}

/// Handle registration form submission.
///
/// The backend signs the new account in straight away.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let new_user = match form.validate() {
        Ok(new_user) => new_user,
        Err(message) => {
            set_flash(&session, Flash::error(message)).await;
            return Redirect::to(&register_url(form.next.as_deref())).into_response();
        }
    };

    match state.api().register(&new_user).await {
        Ok((user, backend)) => {
            let greeting = format!("Welcome to Printloom, {}!", user.first_name());
            if let Err(e) = sign_in(&session, &user, backend, greeting).await {
                tracing::error!("Failed to set session: {}", e);
                set_flash(
                    &session,
                    Flash::info("Your account was created. Please sign in."),
                )
                .await;
                return Redirect::to("/auth/login").into_response();
            }
            tracing::info!(user_id = %user.id, "Customer registered");
            Redirect::to(&safe_redirect(form.next.as_deref(), "/")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            set_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to(&register_url(form.next.as_deref())).into_response()
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Ends the backend session (best effort) and destroys the local one.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Response {
    if let Some(auth) = auth {
        if let Err(e) = state.api().logout(&auth.backend).await {
            tracing::warn!(error = %e, "Failed to end backend session");
        }
    }

    if let Err(e) = clear_auth_session(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    set_flash(&session, Flash::info("You have been signed out.")).await;
    Redirect::to("/").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            name: "Ada Lovelace".to_string(),
            email: " Ada@Example.com ".to_string(),
            password: "analytical".to_string(),
            password_confirm: "analytical".to_string(),
            next: None,
        }
    }

    #[test]
    fn test_valid_registration() {
        let new_user = form().validate().unwrap();
        assert_eq!(new_user.email, "ada@example.com");
        assert_eq!(new_user.name, "Ada Lovelace");
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        let mut form = form();
        form.email = "not-an-email".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            "Please enter a valid email address."
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_new_password("short", "short").is_err());
        assert_eq!(
            validate_new_password("longenough", "different").unwrap_err(),
            "The passwords do not match."
        );
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }

    #[test]
    fn test_login_url_keeps_next() {
        assert_eq!(login_url(Some("/checkout")), "/auth/login?next=%2Fcheckout");
        assert_eq!(login_url(None), "/auth/login");
    }
}
