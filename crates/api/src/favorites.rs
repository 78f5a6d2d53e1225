//! `/api/favorites` endpoints.

use printloom_core::ProductId;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use crate::Result;
use crate::client::{ApiClient, BackendSession};
use crate::types::Product;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewFavorite {
    product_id: ProductId,
}

impl ApiClient {
    /// Products the user marked as favorite.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn list_favorites(&self, session: &BackendSession) -> Result<Vec<Product>> {
        self.get("/api/favorites", Some(session)).await
    }

    /// Mark a product as favorite.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn add_favorite(&self, session: &BackendSession, product_id: ProductId) -> Result<()> {
        self.request_empty(
            Method::POST,
            "/api/favorites",
            Some(&NewFavorite { product_id }),
            Some(session),
        )
        .await
    }

    /// Unmark a favorite.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn remove_favorite(
        &self,
        session: &BackendSession,
        product_id: ProductId,
    ) -> Result<()> {
        self.request_empty::<()>(
            Method::DELETE,
            &format!("/api/favorites/{product_id}"),
            None,
            Some(session),
        )
        .await
    }
}
