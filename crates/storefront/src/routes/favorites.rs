//! Favorites route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use printloom_core::ProductId;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::layout::Layout;
use crate::middleware::RequireAuth;
use crate::routes::back_to;
use crate::state::AppState;
use crate::views::ProductCard;

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "favorites.html")]
pub struct FavoritesTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
}

/// Display the shopper's favorites.
#[instrument(skip(state, layout, auth))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
) -> Result<Response> {
    let (favorites, settings) = tokio::join!(
        state.api().list_favorites(&auth.backend),
        state.api().settings_or_default()
    );

    Ok(FavoritesTemplate {
        layout,
        products: favorites?
            .iter()
            .map(|p| ProductCard::new(p, &settings, state.api()))
            .collect(),
    }
    .into_response())
}

/// Add a product to favorites.
#[instrument(skip(state, session, auth, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ProductId>,
    headers: HeaderMap,
) -> Response {
    match state.api().add_favorite(&auth.backend, id).await {
        Ok(()) => set_flash(&session, Flash::success("Added to your favorites.")).await,
        Err(e) => {
            tracing::warn!(error = %e, "Add favorite failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(&back_to(&headers, "/favorites")).into_response()
}

/// Remove a product from favorites.
#[instrument(skip(state, session, auth, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ProductId>,
    headers: HeaderMap,
) -> Response {
    match state.api().remove_favorite(&auth.backend, id).await {
        Ok(()) => set_flash(&session, Flash::success("Removed from your favorites.")).await,
        Err(e) => {
            tracing::warn!(error = %e, "Remove favorite failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(&back_to(&headers, "/favorites")).into_response()
}
