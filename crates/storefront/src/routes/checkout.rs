//! Checkout route handlers.
//!
//! # Flow
//!
//! 1. `GET /checkout` shows the shipping form and the cart summary.
//! 2. `POST /checkout` places the order at current prices, asks the backend
//!    for a payment intent and renders the card form.
//! 3. Stripe.js confirms the card in the browser and returns to
//!    `/checkout/complete`, which clears the cart on success.
//!
//! Payment confirmation itself belongs to Stripe and the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use printloom_api::{NewOrder, NewPaymentIntent, Order, Settings, ShippingAddress};
use printloom_core::{CurrencyCode, OrderId, OrderStatus, PaymentStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::layout::Layout;
use crate::middleware::RequireAuth;
use crate::routes::cart::{CartView, load_cart};
use crate::state::AppState;

// =============================================================================
// Forms
// =============================================================================

/// Shipping form data.
#[derive(Debug, Default, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

impl ShippingForm {
    /// Validate and convert to the backend shape.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message naming the first missing field.
    pub fn into_address(self) -> std::result::Result<ShippingAddress, String> {
        let required = [
            ("full name", &self.full_name),
            ("street", &self.street),
            ("city", &self.city),
            ("postal code", &self.postal_code),
            ("country", &self.country),
        ];
        if let Some((label, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(format!("Please enter your {label}."));
        }

        let phone = self.phone.trim();
        Ok(ShippingAddress {
            full_name: self.full_name.trim().to_string(),
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
        })
    }
}

/// Query string Stripe appends when returning from the card form.
#[derive(Debug, Deserialize)]
pub struct CompleteQuery {
    pub order_id: Option<OrderId>,
    pub redirect_status: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Shipping form + order summary.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub full_name: String,
}

/// Card payment page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub layout: Layout,
    pub order_id: i64,
    pub total: String,
    pub client_secret: String,
    pub publishable_key: String,
    pub return_url: String,
}

/// Payment result page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CompleteTemplate {
    pub layout: Layout,
    pub order_id: Option<i64>,
    pub succeeded: bool,
    pub processing: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the shipping form.
#[instrument(skip(state, session, layout, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
) -> Result<Response> {
    let (cart, settings) = tokio::join!(
        load_cart(state.api(), &auth.backend),
        state.api().settings_or_default()
    );
    let cart = cart?;

    if cart.is_empty() {
        set_flash(&session, Flash::info("Your cart is empty.")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(CheckoutTemplate {
        layout,
        cart: CartView::build(&cart, &settings, state.api()),
        full_name: auth.user.name,
    }
    .into_response())
}

/// Place the order and start the card payment.
#[instrument(skip(state, session, layout, auth, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let address = match form.into_address() {
        Ok(address) => address,
        Err(message) => {
            set_flash(&session, Flash::error(message)).await;
            return Ok(Redirect::to("/checkout").into_response());
        }
    };

    let (cart, settings) = tokio::join!(
        load_cart(state.api(), &auth.backend),
        state.api().settings_or_default()
    );
    let cart = cart?;
    if cart.is_empty() {
        set_flash(&session, Flash::info("Your cart is empty.")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let new_order = NewOrder::from_cart(&cart, &settings, address);
    let order = match state.api().create_order(&auth.backend, &new_order).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(error = %e, "Order creation failed");
            set_flash(&session, Flash::error(e.user_message())).await;
            return Ok(Redirect::to("/checkout").into_response());
        }
    };

    let id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", id.as_str())]));
    tracing::info!(order_id = %order.id, "Order placed");

    start_payment(&state, &session, layout, &auth.backend, &order, &settings).await
}

/// Retry the card payment for an unpaid order.
#[instrument(skip(state, session, layout, auth))]
pub async fn pay_order(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let (order, settings) = tokio::join!(
        state.api().get_order(&auth.backend, id),
        state.api().settings_or_default()
    );
    let order = order?;

    if !awaits_payment(&order) {
        set_flash(&session, Flash::info("This order does not need a payment.")).await;
        return Ok(Redirect::to(&format!("/account/orders/{id}")).into_response());
    }

    start_payment(&state, &session, layout, &auth.backend, &order, &settings).await
}

/// Whether an order can still be paid by card.
#[must_use]
pub fn awaits_payment(order: &Order) -> bool {
    matches!(order.payment_status, PaymentStatus::Pending | PaymentStatus::Failed)
        && order.status != OrderStatus::Cancelled
}

/// The payment intent for an order: the total shown on the order pages, in
/// minor units.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the total does not fit in minor units.
pub fn payment_intent_for(order: &Order, currency: CurrencyCode) -> Result<NewPaymentIntent> {
    let total = order.totals(currency).total;
    let amount = total
        .minor_units()
        .map_err(|e| AppError::Internal(format!("order {} total {total}: {e}", order.id)))?;
    Ok(NewPaymentIntent {
        order_id: order.id,
        amount,
        currency: currency.code().to_lowercase(),
    })
}

/// Create a payment intent for the order and render the card form.
async fn start_payment(
    state: &AppState,
    session: &Session,
    layout: Layout,
    backend: &printloom_api::BackendSession,
    order: &Order,
    settings: &Settings,
) -> Result<Response> {
    let total = order.totals(settings.currency).total;
    let intent = payment_intent_for(order, settings.currency)?;

    match state.api().create_payment_intent(backend, &intent).await {
        Ok(payment) => Ok(PaymentTemplate {
            layout,
            order_id: order.id.as_i64(),
            total: total.display(),
            client_secret: payment.client_secret,
            publishable_key: state.config().stripe_publishable_key.clone(),
            return_url: format!(
                "{}/checkout/complete?order_id={}",
                state.config().base_url.trim_end_matches('/'),
                order.id
            ),
        }
        .into_response()),
        Err(e) => {
            tracing::error!(error = %e, order_id = %order.id, "Payment intent creation failed");
            set_flash(
                session,
                Flash::error(format!(
                    "Your order #{} was placed, but the payment could not be started. {}",
                    order.id,
                    e.user_message()
                )),
            )
            .await;
            Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response())
        }
    }
}

/// Payment return page.
///
/// Stripe reports `succeeded`, `processing` or `failed`. The cart is only
/// cleared once the card went through.
#[instrument(skip(state, layout, auth))]
pub async fn complete(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<CompleteQuery>,
) -> Response {
    let status = query.redirect_status.as_deref().unwrap_or_default();
    let succeeded = status == "succeeded";

    if succeeded {
        if let Err(e) = state.api().clear_cart(&auth.backend).await {
            tracing::error!(error = %e, "Failed to clear cart after payment");
        }
    } else {
        tracing::warn!(redirect_status = %status, order_id = ?query.order_id, "Payment not completed");
    }

    CompleteTemplate {
        layout,
        order_id: query.order_id.map(|id| id.as_i64()),
        succeeded,
        processing: status == "processing",
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ShippingForm {
        ShippingForm {
            full_name: " Ada Lovelace ".to_string(),
            street: "1 Loop Rd".to_string(),
            city: "London".to_string(),
            postal_code: "N1".to_string(),
            country: "UK".to_string(),
            phone: String::new(),
        }
    }

    #[test]
    fn test_valid_address() {
        let address = form().into_address().unwrap();
        assert_eq!(address.full_name, "Ada Lovelace");
        assert!(address.phone.is_none());
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut form = form();
        form.city = "  ".to_string();
        assert_eq!(form.into_address().unwrap_err(), "Please enter your city.");
    }

    #[test]
    fn test_awaits_payment() {
        let mut order: Order = serde_json::from_str(
            r#"{"id":1,"userId":1,"status":"PENDING","paymentStatus":"PENDING"}"#,
        )
        .unwrap();
        assert!(awaits_payment(&order));
        order.payment_status = PaymentStatus::Succeeded;
        assert!(!awaits_payment(&order));
        order.payment_status = PaymentStatus::Failed;
        order.status = OrderStatus::Cancelled;
        assert!(!awaits_payment(&order));
    }

    #[test]
    fn test_payment_amount_matches_order_page_total() {
        let order: Order = serde_json::from_str(
            r#"{"id":4,"userId":1,"shippingCost":5,"totalAmount":12.22,
                "items":[{"id":1,"productId":5,"productName":"Sticker","quantity":3,"unitPrice":2.41}]}"#,
        )
        .unwrap();
        let intent = payment_intent_for(&order, CurrencyCode::EUR).unwrap();
        assert_eq!(intent.amount, 1223);
        assert_eq!(intent.currency, "eur");
    }
}
