//! `/api/order-change-requests` endpoints.

use printloom_core::{ChangeRequestId, OrderId};
use reqwest::Method;
use tracing::instrument;

use crate::Result;
use crate::client::{ApiClient, BackendSession};
use crate::types::{ChangeRequestResolution, NewChangeRequest, OrderChangeRequest};

impl ApiClient {
    /// Change requests visible to the session (all of them for an admin).
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn list_change_requests(
        &self,
        session: &BackendSession,
    ) -> Result<Vec<OrderChangeRequest>> {
        let mut requests: Vec<OrderChangeRequest> = self
            .get("/api/order-change-requests", Some(session))
            .await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    /// Change requests for one order.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    pub async fn change_requests_for_order(
        &self,
        session: &BackendSession,
        order_id: OrderId,
    ) -> Result<Vec<OrderChangeRequest>> {
        let mut requests = self.list_change_requests(session).await?;
        requests.retain(|r| r.order_id == order_id);
        Ok(requests)
    }

    /// Submit a change request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Status`] when the backend refuses it, e.g.
    /// because the order already shipped.
    #[instrument(skip(self, session, request), fields(order_id = %request.order_id))]
    pub async fn create_change_request(
        &self,
        session: &BackendSession,
        request: &NewChangeRequest,
    ) -> Result<OrderChangeRequest> {
        self.request(
            Method::POST,
            "/api/order-change-requests",
            Some(request),
            Some(session),
        )
        .await
    }

    /// Approve or reject a change request (admin only).
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session, resolution), fields(status = %resolution.status.as_str()))]
    pub async fn resolve_change_request(
        &self,
        session: &BackendSession,
        id: ChangeRequestId,
        resolution: &ChangeRequestResolution,
    ) -> Result<()> {
        self.request_empty(
            Method::PUT,
            &format!("/api/order-change-requests/{id}"),
            Some(resolution),
            Some(session),
        )
        .await
    }
}
