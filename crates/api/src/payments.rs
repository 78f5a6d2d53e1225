//! `/api/payments` endpoints.

use reqwest::Method;
use tracing::instrument;

use crate::Result;
use crate::client::{ApiClient, BackendSession};
use crate::types::{NewPaymentIntent, Payment, PaymentIntent};

impl ApiClient {
    /// Ask the backend for a card payment intent. The returned client secret
    /// is handed to the browser, which confirms the payment with the
    /// provider directly.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session, intent), fields(order_id = %intent.order_id, amount = intent.amount))]
    pub async fn create_payment_intent(
        &self,
        session: &BackendSession,
        intent: &NewPaymentIntent,
    ) -> Result<PaymentIntent> {
        self.request(
            Method::POST,
            "/api/payments/create-payment-intent",
            Some(intent),
            Some(session),
        )
        .await
    }

    /// All recorded payments (admin only), newest first.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn list_payments(&self, session: &BackendSession) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self.get("/api/payments", Some(session)).await?;
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(payments)
    }
}
