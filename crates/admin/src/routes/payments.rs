//! Payments route handler.

use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use printloom_core::{Page, PaymentStatus, StatusFilter};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    flash::{Flash, take_flash},
    middleware::RequireAdminAuth,
    state::AppState,
    views::{AdminUserView, Pager, PaymentRow, SelectOption, query_prefix, status_filter_options},
};

use super::{ListQuery, PER_PAGE, render};

/// Payments list page template.
#[derive(Template)]
#[template(path = "payments/index.html")]
pub struct PaymentsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub payments: Vec<PaymentRow>,
    pub status_options: Vec<SelectOption>,
    pub pager: Pager,
}

/// Build the payments router.
pub fn router() -> Router<AppState> {
    Router::new().route("/payments", get(index))
}

/// Payments list page handler. The backend returns newest first.
///
/// GET /payments
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let payments = state.api().list_payments(&current.backend).await?;

    let status = StatusFilter::<PaymentStatus>::from_query(query.status.as_deref());
    let selected = status.selected().map(|s| s.as_str());
    let payments: Vec<_> = payments
        .into_iter()
        .filter(|payment| status.matches(payment.status))
        .collect();

    let page = Page::paginate(payments, query.page(), PER_PAGE);
    let pager = Pager::new(
        &page,
        query_prefix(&[("status", selected.unwrap_or_default())]),
    );

    Ok(render(&PaymentsIndexTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/payments".to_string(),
        flash: take_flash(&session).await,
        payments: page.items.iter().map(PaymentRow::from).collect(),
        status_options: status_filter_options(
            PaymentStatus::all().iter().map(|s| (s.as_str(), s.label())),
            selected,
        ),
        pager,
    }))
}
