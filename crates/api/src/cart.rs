//! `/api/cart` endpoints.

use printloom_core::CartItemId;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use crate::Result;
use crate::client::{ApiClient, BackendSession};
use crate::types::{Cart, NewCartItem};

#[derive(Serialize)]
struct QuantityUpdate {
    quantity: u32,
}

impl ApiClient {
    /// The signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn get_cart(&self, session: &BackendSession) -> Result<Cart> {
        self.get("/api/cart", Some(session)).await
    }

    /// Add a line to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Status`] when the backend refuses the item.
    #[instrument(skip(self, session, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add_to_cart(&self, session: &BackendSession, item: &NewCartItem) -> Result<()> {
        self.request_empty(Method::POST, "/api/cart", Some(item), Some(session))
            .await
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn update_cart_item(
        &self,
        session: &BackendSession,
        id: CartItemId,
        quantity: u32,
    ) -> Result<()> {
        self.request_empty(
            Method::PUT,
            &format!("/api/cart/{id}"),
            Some(&QuantityUpdate { quantity }),
            Some(session),
        )
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn remove_cart_item(&self, session: &BackendSession, id: CartItemId) -> Result<()> {
        self.request_empty::<()>(
            Method::DELETE,
            &format!("/api/cart/{id}"),
            None,
            Some(session),
        )
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn clear_cart(&self, session: &BackendSession) -> Result<()> {
        self.request_empty::<()>(Method::DELETE, "/api/cart", None, Some(session))
            .await
    }
}
