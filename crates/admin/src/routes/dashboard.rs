//! Dashboard route handler.

use askama::Template;
use axum::{Router, extract::State, response::Response, routing::get};
use printloom_core::ChangeRequestStatus;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    flash::{Flash, take_flash},
    middleware::RequireAdminAuth,
    state::AppState,
    views::{AdminUserView, OrderRow, newest_first, paid_total},
};

use super::{or_default, render};

/// Orders listed under "Recent orders".
const RECENT_ORDERS: usize = 5;

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub orders: usize,
    pub open_orders: usize,
    pub revenue: String,
    pub customers: usize,
    pub products: usize,
    pub pending_change_requests: usize,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub metrics: DashboardMetrics,
    /// Most recent first.
    pub orders: Vec<OrderRow>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip_all)]
async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
) -> Result<Response> {
    let api = state.api();
    let (orders, products, users, change_requests, settings) = tokio::join!(
        api.list_orders(&current.backend),
        api.list_products(),
        api.list_users(&current.backend),
        api.list_change_requests(&current.backend),
        api.settings_or_default(),
    );

    let orders = newest_first(orders?);
    let products = or_default(products, "products")?;
    let users = or_default(users, "customers")?;
    let change_requests = or_default(change_requests, "change requests")?;

    let metrics = DashboardMetrics {
        orders: orders.len(),
        open_orders: orders.iter().filter(|o| o.status.is_open()).count(),
        revenue: paid_total(&orders, &settings).display(),
        customers: users.iter().filter(|u| !u.is_admin()).count(),
        products: products.len(),
        pending_change_requests: change_requests
            .iter()
            .filter(|r| r.status == ChangeRequestStatus::Pending)
            .count(),
    };

    let recent_orders: Vec<OrderRow> = orders
        .iter()
        .take(RECENT_ORDERS)
        .map(|order| OrderRow::new(order, &settings))
        .collect();

    Ok(render(&DashboardTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        metrics,
        orders: recent_orders,
    }))
}
