//! Order management route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Redirect, Response},
    routing::{get, post},
};
use printloom_api::Order;
use printloom_core::{OrderId, OrderStatus, Page, StatusFilter};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    flash::{Flash, set_flash, take_flash},
    middleware::RequireAdminAuth,
    state::AppState,
    views::{
        AdminUserView, ChangeRequestView, OrderDetailView, OrderRow, Pager, SelectOption,
        newest_first, query_prefix, status_filter_options,
    },
};

use super::{ListQuery, PER_PAGE, or_default, render};

// =============================================================================
// Templates
// =============================================================================

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub orders: Vec<OrderRow>,
    pub search: String,
    pub status_options: Vec<SelectOption>,
    /// Whether a status or search narrowed the list.
    pub filtered: bool,
    pub pager: Pager,
}

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub order: OrderDetailView,
    pub status_options: Vec<SelectOption>,
    pub change_requests: Vec<ChangeRequestView>,
    /// Where the resolve forms send the admin back to.
    pub return_to: String,
}

/// Printable invoice template.
#[derive(Template)]
#[template(path = "orders/print.html")]
pub struct OrderPrintTemplate {
    pub order: OrderDetailView,
}

/// Status update form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
        .route("/orders/{id}/print", get(print))
}

/// Orders matching a status filter and a client name/email search.
pub fn filter_orders(
    orders: Vec<Order>,
    status: StatusFilter<OrderStatus>,
    search: &str,
) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|order| status.matches(order.status))
        .filter(|order| order.matches_client(search))
        .collect()
}

fn status_options(current: Option<&str>) -> Vec<SelectOption> {
    status_filter_options(
        OrderStatus::all().iter().map(|s| (s.as_str(), s.label())),
        current,
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Orders list page handler.
///
/// GET /orders
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let (orders, settings) = tokio::join!(
        state.api().list_orders(&current.backend),
        state.api().settings_or_default()
    );

    let status = StatusFilter::<OrderStatus>::from_query(query.status.as_deref());
    let selected = status.selected().map(|s| s.as_str());
    let search = query.search().to_string();

    let orders = newest_first(filter_orders(orders?, status, &search));
    let page = Page::paginate(orders, query.page(), PER_PAGE);
    let pager = Pager::new(
        &page,
        query_prefix(&[("status", selected.unwrap_or_default()), ("q", &search)]),
    );

    Ok(render(&OrdersIndexTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        orders: page
            .items
            .iter()
            .map(|order| OrderRow::new(order, &settings))
            .collect(),
        filtered: selected.is_some() || !search.is_empty(),
        search,
        status_options: status_options(selected),
        pager,
    }))
}

/// Order detail page handler.
///
/// GET /orders/{id}
#[instrument(skip_all)]
async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let api = state.api();
    let (order, change_requests, settings) = tokio::join!(
        api.get_order(&current.backend, id),
        api.change_requests_for_order(&current.backend, id),
        api.settings_or_default()
    );
    let order = order?;
    let change_requests = or_default(change_requests, "change requests")?;

    let status_options = OrderStatus::all()
        .iter()
        .map(|s| SelectOption::new(s.as_str(), s.label(), order.status.as_str()))
        .collect();

    Ok(render(&OrderShowTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        order: OrderDetailView::new(&order, &settings, api),
        status_options,
        change_requests: change_requests.iter().map(ChangeRequestView::from).collect(),
        return_to: format!("/orders/{id}"),
    }))
}

/// Update an order's status.
///
/// POST /orders/{id}/status
#[instrument(skip_all)]
async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let flash = match form.status.parse::<OrderStatus>() {
        Err(_) => Flash::error(format!("Unknown order status \"{}\".", form.status)),
        Ok(status) => match state
            .api()
            .update_order_status(&current.backend, id, status)
            .await
        {
            Ok(order) => {
                tracing::info!(order_id = %id, status = %order.status, "Order status updated");
                Flash::success(format!("Order #{id} marked as {}.", order.status.label()))
            }
            Err(e) => {
                tracing::warn!(error = %e, order_id = %id, "Failed to update order status");
                Flash::error(e.user_message())
            }
        },
    };
    set_flash(&session, flash).await;
    Redirect::to(&format!("/orders/{id}"))
}

/// Printable invoice.
///
/// GET /orders/{id}/print
#[instrument(skip_all)]
async fn print(
    State(state): State<AppState>,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let (order, settings) = tokio::join!(
        state.api().get_order(&current.backend, id),
        state.api().settings_or_default()
    );
    Ok(render(&OrderPrintTemplate {
        order: OrderDetailView::new(&order?, &settings, state.api()),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn orders() -> Vec<Order> {
        serde_json::from_str(
            r#"[
                {"id":1,"userId":4,"status":"CANCELLED","user":{"id":4,"name":"Ada Lovelace","email":"ada@printloom.test"}},
                {"id":2,"userId":5,"status":"SHIPPED","user":{"id":5,"name":"Charles Babbage","email":"cb@printloom.test"}},
                {"id":3,"userId":5,"status":"CANCELLED","user":{"id":5,"name":"Charles Babbage","email":"cb@printloom.test"}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_status_filter_only() {
        let cancelled = filter_orders(orders(), StatusFilter::Only(OrderStatus::Cancelled), "");
        assert_eq!(cancelled.len(), 2);
        assert_eq!(filter_orders(orders(), StatusFilter::All, "").len(), 3);
    }

    #[test]
    fn test_status_and_client_search() {
        let found = filter_orders(orders(), StatusFilter::Only(OrderStatus::Cancelled), "babbage");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, OrderId::new(3));

        let by_email = filter_orders(orders(), StatusFilter::All, "ADA@printloom");
        assert_eq!(by_email.len(), 1);
    }

    #[test]
    fn test_unmatched_client_gives_empty_list() {
        let none = filter_orders(orders(), StatusFilter::Only(OrderStatus::Cancelled), "hopper");
        assert!(none.is_empty());
    }

    #[test]
    fn test_status_options_select_current() {
        let options = status_options(Some("SHIPPED"));
        assert!(options.iter().any(|o| o.value == "SHIPPED" && o.selected));
        assert!(status_options(None)[0].selected);
    }
}
