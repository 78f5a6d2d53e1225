//! Account route handlers.
//!
//! These routes require authentication. Profile, orders and change requests
//! are always read fresh from the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use printloom_api::{NewChangeRequest, Order, PasswordChange, ProfileUpdate};
use printloom_core::{ChangeRequestKind, ChangeRequestStatus, Email, OrderId, Page};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::layout::Layout;
use crate::middleware::RequireAuth;
use crate::models::{AuthSession, CurrentUser, session_keys};
use crate::routes::auth::validate_new_password;
use crate::routes::checkout::awaits_payment;
use crate::state::AppState;
use crate::views::{ChangeRequestView, OrderDetailView, OrderRow, Pager, query_prefix};

/// Orders shown on the account overview.
const RECENT_ORDERS: usize = 5;

/// Orders per history page.
pub const ORDERS_PER_PAGE: usize = 10;

/// Longest change request message accepted.
const MAX_CHANGE_MESSAGE_CHARS: usize = 1000;

// =============================================================================
// Forms
// =============================================================================

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl ProfileForm {
    /// Validate into a backend update.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for a blank name or invalid email.
    pub fn validate(&self) -> std::result::Result<ProfileUpdate, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name.".to_string());
        }
        let email = Email::from_form_input(&self.email).map_err(|e| e.to_string())?;

        Ok(ProfileUpdate {
            name: name.to_string(),
            email: email.into_inner(),
            phone: non_blank(&self.phone),
            address: non_blank(&self.address),
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Password form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: String,
}

/// Change request form data.
#[derive(Debug, Deserialize)]
pub struct ChangeRequestForm {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

impl ChangeRequestForm {
    /// Validate into a backend request for `order_id`.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for an unknown kind or a blank or
    /// overlong message.
    pub fn validate(&self, order_id: OrderId) -> std::result::Result<NewChangeRequest, String> {
        let kind: ChangeRequestKind = self
            .kind
            .parse()
            .map_err(|_| "Please choose what you would like to change.".to_string())?;
        let message = self.message.trim();
        if message.is_empty() {
            return Err("Please describe the change you need.".to_string());
        }
        if message.chars().count() > MAX_CHANGE_MESSAGE_CHARS {
            return Err(format!(
                "Please keep your message under {MAX_CHANGE_MESSAGE_CHARS} characters."
            ));
        }

        Ok(NewChangeRequest {
            order_id,
            kind,
            message: message.to_string(),
        })
    }
}

/// `?page=` on the order history.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<usize>,
}

// =============================================================================
// Templates
// =============================================================================

/// Profile form values.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub member_since: String,
}

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
    /// Most recent orders only.
    pub orders: Vec<OrderRow>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRow>,
    pub pager: Pager,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub order: OrderDetailView,
    pub change_requests: Vec<ChangeRequestView>,
    pub can_request_change: bool,
    pub can_pay: bool,
}

/// Printable invoice, rendered without the site chrome.
#[derive(Template, WebTemplate)]
#[template(path = "account/invoice.html")]
pub struct InvoiceTemplate {
    pub order: OrderDetailView,
    pub nonce: String,
}

/// Newest orders first.
fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
    });
    orders
}

// =============================================================================
// Account Routes
// =============================================================================

/// Display the account overview.
#[instrument(skip(state, layout, auth))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
) -> Result<impl IntoResponse> {
    let (user, orders, settings) = tokio::join!(
        state.api().me(&auth.backend),
        state.api().list_orders(&auth.backend),
        state.api().settings_or_default()
    );
    let user = user?;
    let orders = orders.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load orders for overview");
        Vec::new()
    });

    Ok(AccountTemplate {
        layout,
        profile: ProfileView {
            name: user.name,
            email: user.email,
            phone: user.phone.unwrap_or_default(),
            address: user.address.unwrap_or_default(),
            member_since: crate::views::format_date(user.created_at),
        },
        orders: newest_first(orders)
            .iter()
            .take(RECENT_ORDERS)
            .map(|order| OrderRow::new(order, &settings))
            .collect(),
    })
}

/// Save profile changes.
#[instrument(skip(state, session, auth, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let update = match form.validate() {
        Ok(update) => update,
        Err(message) => {
            set_flash(&session, Flash::error(message)).await;
            return Ok(Redirect::to("/account").into_response());
        }
    };

    match state
        .api()
        .update_user(&auth.backend, auth.user.id, &update)
        .await
    {
        Ok(user) => {
            let refreshed = AuthSession {
                user: CurrentUser::from(&user),
                backend: auth.backend,
            };
            session.insert(session_keys::AUTH, &refreshed).await?;
            tracing::info!(user_id = %user.id, "Profile updated");
            set_flash(&session, Flash::success("Your profile has been saved.")).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Profile update failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to("/account").into_response())
}

/// Change the account password.
#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Response {
    if form.current_password.is_empty() {
        set_flash(&session, Flash::error("Please enter your current password.")).await;
        return Redirect::to("/account").into_response();
    }
    if let Err(message) = validate_new_password(&form.new_password, &form.new_password_confirm) {
        set_flash(&session, Flash::error(message)).await;
        return Redirect::to("/account").into_response();
    }

    let change = PasswordChange {
        current_password: form.current_password,
        new_password: form.new_password,
    };
    match state.api().change_password(&auth.backend, &change).await {
        Ok(()) => {
            tracing::info!(user_id = %auth.user.id, "Password changed");
            set_flash(&session, Flash::success("Your password has been changed.")).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password change failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/account").into_response()
}

// =============================================================================
// Order Routes
// =============================================================================

/// Display the order history.
#[instrument(skip(state, layout, auth))]
pub async fn orders(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let (orders, settings) = tokio::join!(
        state.api().list_orders(&auth.backend),
        state.api().settings_or_default()
    );

    let page = Page::paginate(newest_first(orders?), query.page.unwrap_or(1), ORDERS_PER_PAGE);
    let pager = Pager::new(&page, query_prefix(&[]));

    Ok(OrdersTemplate {
        layout,
        orders: page.items.iter().map(|o| OrderRow::new(o, &settings)).collect(),
        pager,
    })
}

/// Display one order with its change requests.
#[instrument(skip(state, layout, auth))]
pub async fn order_detail(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let (order, requests, settings) = tokio::join!(
        state.api().get_order(&auth.backend, id),
        state.api().change_requests_for_order(&auth.backend, id),
        state.api().settings_or_default()
    );
    let order = order?;
    let requests = requests.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load change requests");
        Vec::new()
    });

    let has_pending = requests
        .iter()
        .any(|r| r.status == ChangeRequestStatus::Pending);

    Ok(OrderTemplate {
        layout,
        can_request_change: order.status.is_open() && !has_pending,
        can_pay: awaits_payment(&order),
        order: OrderDetailView::new(&order, &settings, state.api()),
        change_requests: requests.iter().map(ChangeRequestView::from).collect(),
    })
}

/// Render the printable invoice.
#[instrument(skip(state, auth, nonce))]
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    nonce: crate::middleware::CspNonce,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let (order, settings) = tokio::join!(
        state.api().get_order(&auth.backend, id),
        state.api().settings_or_default()
    );
    let order = order?;

    Ok(InvoiceTemplate {
        order: OrderDetailView::new(&order, &settings, state.api()),
        nonce: nonce.value().to_string(),
    })
}

/// Ask the back office to modify or cancel an order.
#[instrument(skip(state, session, auth, form))]
pub async fn request_change(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
    Form(form): Form<ChangeRequestForm>,
) -> Result<Response> {
    let back = format!("/account/orders/{id}");

    let request = match form.validate(id) {
        Ok(request) => request,
        Err(message) => {
            set_flash(&session, Flash::error(message)).await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    let order = state.api().get_order(&auth.backend, id).await?;
    if !order.status.is_open() {
        set_flash(
            &session,
            Flash::error("This order can no longer be changed."),
        )
        .await;
        return Ok(Redirect::to(&back).into_response());
    }

    match state
        .api()
        .create_change_request(&auth.backend, &request)
        .await
    {
        Ok(created) => {
            tracing::info!(order_id = %id, request_id = %created.id, "Change request sent");
            set_flash(
                &session,
                Flash::success("Your request has been sent. We'll get back to you soon."),
            )
            .await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Change request failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_blank_optionals_are_omitted() {
        let form = ProfileForm {
            name: " Ada ".to_string(),
            email: "ADA@example.com".to_string(),
            phone: "  ".to_string(),
            address: "1 Loom Lane".to_string(),
        };
        let update = form.validate().unwrap();
        assert_eq!(update.name, "Ada");
        assert_eq!(update.email, "ada@example.com");
        assert!(update.phone.is_none());
        assert_eq!(update.address.as_deref(), Some("1 Loom Lane"));
    }

    #[test]
    fn test_change_request_validation() {
        let id = OrderId::new(12);
        let form = ChangeRequestForm {
            kind: "cancel".to_string(),
            message: " Ordered the wrong size ".to_string(),
        };
        let request = form.validate(id).unwrap();
        assert_eq!(request.kind, ChangeRequestKind::Cancel);
        assert_eq!(request.message, "Ordered the wrong size");

        let blank = ChangeRequestForm {
            kind: "MODIFY".to_string(),
            message: "   ".to_string(),
        };
        assert!(blank.validate(id).is_err());

        let unknown = ChangeRequestForm {
            kind: "refund".to_string(),
            message: "Please".to_string(),
        };
        assert!(unknown.validate(id).is_err());
    }
}
