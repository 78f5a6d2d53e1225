//! `/api/orders` endpoints.
//!
//! The backend scopes `GET /api/orders` to the caller: customers see their own
//! orders, admins see every order.

use printloom_core::{OrderId, OrderStatus};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use crate::Result;
use crate::client::{ApiClient, BackendSession};
use crate::types::{NewOrder, Order};

#[derive(Serialize)]
struct StatusUpdate {
    status: OrderStatus,
}

impl ApiClient {
    /// Orders visible to the session, newest first.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn list_orders(&self, session: &BackendSession) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.get("/api/orders", Some(session)).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::NotFound`] for unknown ids or orders the
    /// caller may not see.
    #[instrument(skip(self, session))]
    pub async fn get_order(&self, session: &BackendSession, id: OrderId) -> Result<Order> {
        self.get(&format!("/api/orders/{id}"), Some(session)).await
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Status`] when the backend rejects it.
    #[instrument(skip(self, session, order), fields(items = order.items.len()))]
    pub async fn create_order(&self, session: &BackendSession, order: &NewOrder) -> Result<Order> {
        self.request(Method::POST, "/api/orders", Some(order), Some(session))
            .await
    }

    /// Move an order to a new status (admin only).
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn update_order_status(
        &self,
        session: &BackendSession,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        self.request(
            Method::PUT,
            &format!("/api/orders/{id}"),
            Some(&StatusUpdate { status }),
            Some(session),
        )
        .await
    }
}
