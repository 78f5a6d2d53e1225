//! Payments recorded by the backend.

use chrono::{DateTime, Utc};
use printloom_core::{CurrencyCode, OrderId, PaymentId, PaymentStatus, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A payment against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub provider_reference: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// The amount as a price.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::new(self.amount, self.currency)
    }
}

/// `POST /api/payments/create-payment-intent` body.
///
/// `amount` is in minor units, as card processors expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentIntent {
    pub order_id: OrderId,
    pub amount: i64,
    pub currency: String,
}

/// Client secret handed to the browser-side card form.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("client_secret", &"[REDACTED]")
            .field("payment_intent_id", &self.payment_intent_id)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_parse() {
        let payment: Payment = serde_json::from_str(
            r#"{"id":1,"orderId":12,"amount":32.59,"currency":"EUR","status":"SUCCEEDED"}"#,
        )
        .unwrap();
        assert_eq!(payment.price().display(), "€32.59");
        assert_eq!(payment.status.label(), "Paid");
    }

    #[test]
    fn test_intent_debug_redacts_secret() {
        let intent: PaymentIntent =
            serde_json::from_str(r#"{"clientSecret":"pi_1_secret_2"}"#).unwrap();
        assert!(!format!("{intent:?}").contains("secret_2"));
    }
}
