//! Authentication route handlers for admin.
//!
//! Admins sign in with their backend account; accounts without the admin
//! role are turned away and their backend session is closed again.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use printloom_api::ApiError;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::{Flash, set_flash, take_flash};
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{AdminSession, CurrentAdmin};
use crate::state::AppState;

use super::render;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub flash: Option<Flash>,
    pub email: String,
}

/// Login form fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page.
///
/// An admin whose backend session is still valid goes straight to the
/// dashboard; a stale one is dropped.
///
/// GET /auth/login
#[instrument(skip_all)]
async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAdminAuth(current): OptionalAdminAuth,
) -> Response {
    if let Some(current) = current {
        match state.api().me(&current.backend).await {
            Ok(user) if user.is_admin() => return Redirect::to("/").into_response(),
            Ok(_) | Err(ApiError::Unauthorized) => {
                if let Err(e) = clear_current_admin(&session).await {
                    tracing::warn!(error = %e, "Failed to clear stale admin session");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not verify admin session"),
        }
    }

    render(&LoginPageTemplate {
        flash: take_flash(&session).await,
        email: String::new(),
    })
}

/// Sign in through the backend.
///
/// POST /auth/login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_string();
    let failure = |message: String| {
        render(&LoginPageTemplate {
            flash: Some(Flash::error(message)),
            email: email.clone(),
        })
    };

    let (user, backend) = match state.api().login(&email, &form.password).await {
        Ok(signed_in) => signed_in,
        Err(ApiError::Unauthorized) => {
            return failure("Invalid email or password.".to_string());
        }
        Err(e) => {
            tracing::warn!(error = %e, "Admin login failed");
            return failure(e.user_message());
        }
    };

    let Some(admin) = CurrentAdmin::from_user(&user) else {
        tracing::warn!(user_id = %user.id, "Non-admin account tried to sign in");
        if let Err(e) = state.api().logout(&backend).await {
            tracing::warn!(error = %e, "Failed to close non-admin backend session");
        }
        return failure("This account does not have admin access.".to_string());
    };

    let admin_session = AdminSession { admin, backend };
    if let Err(e) = set_current_admin(&session, &admin_session).await {
        tracing::error!(error = %e, "Failed to store admin session");
        return failure("Could not start your session. Please try again.".to_string());
    }

    set_sentry_user(&admin_session.admin.id, Some(&admin_session.admin.email));
    tracing::info!(admin_id = %admin_session.admin.id, "Admin signed in");
    set_flash(
        &session,
        Flash::success(format!("Welcome back, {}.", user.first_name())),
    )
    .await;
    Redirect::to("/").into_response()
}

/// Sign out of the console and the backend.
///
/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAdminAuth(current): OptionalAdminAuth,
) -> Redirect {
    if let Some(current) = current
        && let Err(e) = state.api().logout(&current.backend).await
    {
        tracing::warn!(error = %e, "Backend logout failed");
    }

    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush admin session");
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}
