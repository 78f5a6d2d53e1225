//! Customer route handlers.

use askama::Template;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Response,
    routing::get,
};
use printloom_api::User;
use printloom_core::{Page, UserId, matches_search};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    flash::{Flash, take_flash},
    middleware::RequireAdminAuth,
    state::AppState,
    views::{
        AdminUserView, CustomerRow, OrderRow, Pager, format_date, newest_first, paid_total,
        query_prefix,
    },
};

use super::{ListQuery, PER_PAGE, render};

/// Customers list page template.
#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub customers: Vec<CustomerRow>,
    pub search: String,
    pub pager: Pager,
}

/// Customer profile as shown on the detail page.
#[derive(Debug, Clone)]
pub struct CustomerDetailView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub member_since: String,
    pub order_count: usize,
    /// Sum of paid orders.
    pub total_spent: String,
}

/// Customer detail page template.
#[derive(Template)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub customer: CustomerDetailView,
    pub orders: Vec<OrderRow>,
}

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index))
        .route("/customers/{id}", get(show))
}

/// Customers matching a name, email or phone search, by name.
fn filter_customers(mut users: Vec<User>, search: &str) -> Vec<User> {
    users.retain(|user| {
        matches_search(
            [
                user.name.as_str(),
                user.email.as_str(),
                user.phone.as_deref().unwrap_or_default(),
            ],
            search,
        )
    });
    users.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    users
}

/// Customers list page handler.
///
/// GET /customers
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let users = state.api().list_users(&current.backend).await?;
    let search = query.search().to_string();

    let page = Page::paginate(filter_customers(users, &search), query.page(), PER_PAGE);
    let pager = Pager::new(&page, query_prefix(&[("q", &search)]));

    Ok(render(&CustomersIndexTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/customers".to_string(),
        flash: take_flash(&session).await,
        customers: page.items.iter().map(CustomerRow::from).collect(),
        search,
        pager,
    }))
}

/// Customer detail page handler.
///
/// GET /customers/{id}
#[instrument(skip_all)]
async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<UserId>,
) -> Result<Response> {
    let api = state.api();
    let (user, orders, settings) = tokio::join!(
        api.get_user(&current.backend, id),
        api.list_orders(&current.backend),
        api.settings_or_default()
    );
    let user = user?;
    let orders = newest_first(
        orders?
            .into_iter()
            .filter(|order| order.user_id == id)
            .collect(),
    );

    let customer = CustomerDetailView {
        id: user.id.as_i64(),
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        address: user.address.clone(),
        role: user.role.to_string(),
        member_since: format_date(user.created_at),
        order_count: orders.len(),
        total_spent: paid_total(&orders, &settings).display(),
    };

    Ok(render(&CustomerShowTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/customers".to_string(),
        flash: take_flash(&session).await,
        customer,
        orders: orders
            .iter()
            .map(|order| OrderRow::new(order, &settings))
            .collect(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_customers() {
        let users: Vec<User> = serde_json::from_str(
            r#"[{"id":2,"name":"grace hopper","email":"grace@printloom.test","phone":"555-0101"},
                {"id":1,"name":"Ada Lovelace","email":"ada@printloom.test"}]"#,
        )
        .unwrap();

        let all = filter_customers(users.clone(), "");
        assert_eq!(all[0].name, "Ada Lovelace");
        assert_eq!(filter_customers(users.clone(), "0101").len(), 1);
        assert!(filter_customers(users, "babbage").is_empty());
    }
}
