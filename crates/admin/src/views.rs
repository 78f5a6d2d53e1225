//! View models for admin pages.
//!
//! Every amount is formatted here from `printloom_core::pricing` so the
//! templates never do arithmetic.

use chrono::{DateTime, Utc};
use printloom_api::{ApiClient, Order, OrderChangeRequest, Payment, Product, Settings, User};
use printloom_core::{ChangeRequestStatus, OrderStatus, Page, PaymentStatus, Price, UserRole};

use crate::models::CurrentAdmin;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    /// Up to two letters for the avatar.
    pub initials: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        let initials = admin
            .name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();
        Self {
            name: admin.name.clone(),
            email: admin.email.clone(),
            initials,
        }
    }
}

/// One entry of a `<select>`.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        let selected = value == current;
        Self {
            value,
            label: label.into(),
            selected,
        }
    }
}

/// Options for a status filter: "All" followed by each status.
#[must_use]
pub fn status_filter_options<'a>(
    statuses: impl IntoIterator<Item = (&'a str, &'a str)>,
    current: Option<&str>,
) -> Vec<SelectOption> {
    let current = current.unwrap_or("ALL");
    std::iter::once(SelectOption::new("ALL", "All", current))
        .chain(
            statuses
                .into_iter()
                .map(|(value, label)| SelectOption::new(value, label, current)),
        )
        .collect()
}

/// A numbered page link.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

/// Pagination controls that keep the active filters in their links.
#[derive(Debug, Clone)]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub links: Vec<PageLink>,
    /// Encoded filter parameters, ending in `&` when non-empty.
    pub query_prefix: String,
}

impl Pager {
    #[must_use]
    pub fn new<T>(page: &Page<T>, query_prefix: String) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            prev: page.has_prev().then(|| page.prev_page()),
            next: page.has_next().then(|| page.next_page()),
            links: page
                .page_numbers()
                .into_iter()
                .map(|number| PageLink {
                    number,
                    current: number == page.page,
                })
                .collect(),
            query_prefix,
        }
    }

    #[must_use]
    pub const fn is_needed(&self) -> bool {
        self.total_pages > 1
    }
}

/// Build a query prefix from non-empty parameters, e.g. `status=SHIPPED&q=ada&`.
#[must_use]
pub fn query_prefix(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={}&", urlencoding::encode(value)))
        .collect()
}

#[must_use]
pub const fn order_status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Processing => "processing",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Delivered => "delivered",
        OrderStatus::Cancelled => "cancelled",
    }
}

#[must_use]
pub const fn payment_status_class(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Succeeded => "paid",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Refunded => "refunded",
    }
}

#[must_use]
pub const fn change_request_status_class(status: ChangeRequestStatus) -> &'static str {
    match status {
        ChangeRequestStatus::Pending => "pending",
        ChangeRequestStatus::Approved => "approved",
        ChangeRequestStatus::Rejected => "rejected",
    }
}

/// A row in the orders table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i64,
    pub date: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub status: &'static str,
    pub status_class: &'static str,
    pub payment: &'static str,
    pub payment_class: &'static str,
    pub item_count: u32,
    pub total: String,
}

impl OrderRow {
    #[must_use]
    pub fn new(order: &Order, settings: &Settings) -> Self {
        Self {
            id: order.id.as_i64(),
            date: format_date(order.created_at),
            customer_name: order.customer_name().to_string(),
            customer_email: order.customer_email().map(String::from),
            status: order.status.label(),
            status_class: order_status_class(order.status),
            payment: order.payment_status.label(),
            payment_class: payment_status_class(order.payment_status),
            item_count: order.item_count(),
            total: order.totals(settings.currency).total.display(),
        }
    }
}

/// One order line.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub product_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub customization_text: Option<String>,
    pub customization_image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Everything the order detail and print pages show.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub payment: &'static str,
    pub payment_class: &'static str,
    pub items: Vec<OrderItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub address_lines: Vec<String>,
    pub phone: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
}

impl OrderDetailView {
    #[must_use]
    pub fn new(order: &Order, settings: &Settings, api: &ApiClient) -> Self {
        let currency = settings.currency;
        let totals = order.totals(currency);
        Self {
            id: order.id.as_i64(),
            user_id: order.user_id.as_i64(),
            date: format_datetime(order.created_at),
            status: order.status.label(),
            status_class: order_status_class(order.status),
            payment: order.payment_status.label(),
            payment_class: payment_status_class(order.payment_status),
            items: order
                .items
                .iter()
                .map(|item| {
                    let line = item.line(currency);
                    let customization = item.customization.as_ref();
                    OrderItemView {
                        product_id: item.product_id.as_i64(),
                        name: item.product_name.clone(),
                        image_url: item.image_url.as_deref().map(|u| api.asset_url(u)),
                        customization_text: customization.and_then(|c| c.text.clone()),
                        customization_image: customization
                            .and_then(|c| c.image_url.as_deref())
                            .map(|u| api.asset_url(u)),
                        quantity: item.quantity,
                        unit_price: line.unit.display(),
                        line_total: line.total().display(),
                    }
                })
                .collect(),
            subtotal: totals.subtotal.display(),
            shipping: totals.shipping.display(),
            total: totals.total.display(),
            address_lines: order.shipping_address.lines(),
            phone: order.shipping_address.phone.clone(),
            customer_name: order.customer_name().to_string(),
            customer_email: order.customer_email().map(String::from),
        }
    }
}

/// A row in the products table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub image_url: Option<String>,
    /// Before tax.
    pub base_price: String,
    /// After tax, before any discount.
    pub tax_inclusive_price: String,
    /// What a shopper pays.
    pub unit_price: String,
    /// e.g. "-10%".
    pub discount_badge: Option<String>,
    pub customizable: bool,
}

impl ProductRow {
    #[must_use]
    pub fn new(product: &Product, settings: &Settings, api: &ApiClient) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            category: product.category.clone().unwrap_or_else(|| "-".to_string()),
            image_url: product.image_url.as_deref().map(|url| api.asset_url(url)),
            base_price: product.base(settings).display(),
            tax_inclusive_price: product.tax_inclusive_price(settings).display(),
            unit_price: product.unit_price(settings).display(),
            discount_badge: product
                .discount()
                .map(|d| format!("-{}%", d.percent().normalize())),
            customizable: product.customizable,
        }
    }
}

/// A row in the customers table.
#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub joined: String,
}

impl From<&User> for CustomerRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i64(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_else(|| "-".to_string()),
            is_admin: user.role == UserRole::Admin,
            joined: format_date(user.created_at),
        }
    }
}

/// A row in the payments table.
#[derive(Debug, Clone)]
pub struct PaymentRow {
    pub id: i64,
    pub order_id: i64,
    pub amount: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub reference: String,
    pub date: String,
}

impl From<&Payment> for PaymentRow {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.as_i64(),
            order_id: payment.order_id.as_i64(),
            amount: payment.price().display(),
            status: payment.status.label(),
            status_class: payment_status_class(payment.status),
            reference: payment
                .provider_reference
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            date: format_datetime(payment.created_at),
        }
    }
}

/// A change request row, with its resolution form when still pending.
#[derive(Debug, Clone)]
pub struct ChangeRequestView {
    pub id: i64,
    pub order_id: i64,
    pub customer: String,
    pub kind: &'static str,
    pub message: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub admin_response: Option<String>,
    pub date: String,
    pub is_pending: bool,
}

impl From<&OrderChangeRequest> for ChangeRequestView {
    fn from(request: &OrderChangeRequest) -> Self {
        Self {
            id: request.id.as_i64(),
            order_id: request.order_id.as_i64(),
            customer: request.user.as_ref().map_or_else(
                || format!("Customer #{}", request.user_id),
                |user| user.name.clone(),
            ),
            kind: request.kind.label(),
            message: request.message.clone(),
            status: request.status.label(),
            status_class: change_request_status_class(request.status),
            admin_response: request.admin_response.clone(),
            date: format_datetime(request.created_at),
            is_pending: !request.status.is_resolved(),
        }
    }
}

/// Sum of paid orders at their recomputed totals.
#[must_use]
pub fn paid_total(orders: &[Order], settings: &Settings) -> Price {
    orders
        .iter()
        .filter(|order| order.payment_status == PaymentStatus::Succeeded)
        .map(|order| order.totals(settings.currency).total)
        .fold(Price::zero(settings.currency), |sum, total| sum + total)
}

/// Newest orders first.
#[must_use]
pub fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
    });
    orders
}

/// e.g. "2 Apr 2025".
#[must_use]
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.format("%-d %b %Y").to_string())
}

/// e.g. "2 Apr 2025, 09:30".
#[must_use]
pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "-".to_string(),
        |at| at.format("%-d %b %Y, %H:%M").to_string(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use printloom_core::UserId;
    use url::Url;

    use super::*;

    fn settings() -> Settings {
        Settings {
            tax_rate: "0.2".parse().unwrap(),
            ..Settings::default()
        }
    }

    fn api() -> ApiClient {
        ApiClient::new(&printloom_api::ApiConfig::new(
            Url::parse("http://localhost:4000").unwrap(),
        ))
        .unwrap()
    }

    #[test]
    fn test_admin_initials() {
        let admin = CurrentAdmin {
            id: UserId::new(1),
            email: "grace@printloom.test".to_string(),
            name: "grace brewster hopper".to_string(),
        };
        assert_eq!(AdminUserView::from(&admin).initials, "GB");
    }

    #[test]
    fn test_product_row_prices() {
        let product: Product = serde_json::from_str(
            r#"{"id":1,"name":"Mug","basePrice":10,"onSale":true,"discountPercentage":10}"#,
        )
        .unwrap();
        let row = ProductRow::new(&product, &settings(), &api());
        assert_eq!(row.base_price, "€10.00");
        assert_eq!(row.tax_inclusive_price, "€12.00");
        assert_eq!(row.unit_price, "€10.80");
        assert_eq!(row.discount_badge.as_deref(), Some("-10%"));
        assert_eq!(row.category, "-");
    }

    #[test]
    fn test_order_row_uses_customer() {
        let order: Order = serde_json::from_str(
            r#"{"id":7,"userId":4,"status":"CANCELLED","paymentStatus":"REFUNDED","shippingCost":5,
                "user":{"id":4,"name":"Ada Lovelace","email":"ada@printloom.test"},
                "items":[{"id":1,"productId":1,"productName":"Mug","quantity":3,"unitPrice":10}],
                "shippingAddress":{"fullName":"Ada","street":"1 Loop Rd","city":"London","postalCode":"N1","country":"UK"}}"#,
        )
        .unwrap();
        let row = OrderRow::new(&order, &settings());
        assert_eq!(row.customer_name, "Ada Lovelace");
        assert_eq!(row.customer_email.as_deref(), Some("ada@printloom.test"));
        assert_eq!(row.status_class, "cancelled");
        assert_eq!(row.payment_class, "refunded");
        assert_eq!(row.total, "€35.00");
        assert_eq!(row.date, "-");
    }

    #[test]
    fn test_status_filter_options_default_to_all() {
        let options = status_filter_options(
            OrderStatus::all().iter().map(|s| (s.as_str(), s.label())),
            None,
        );
        assert_eq!(options.len(), 6);
        assert!(options[0].selected);

        let options = status_filter_options(
            OrderStatus::all().iter().map(|s| (s.as_str(), s.label())),
            Some("CANCELLED"),
        );
        assert!(options.iter().any(|o| o.value == "CANCELLED" && o.selected));
        assert!(!options[0].selected);
    }

    #[test]
    fn test_pending_change_request_view() {
        let request: OrderChangeRequest = serde_json::from_str(
            r#"{"id":3,"orderId":12,"userId":4,"type":"CANCEL","message":"Wrong size","status":"PENDING"}"#,
        )
        .unwrap();
        let view = ChangeRequestView::from(&request);
        assert!(view.is_pending);
        assert_eq!(view.customer, "Customer #4");
        assert_eq!(view.status_class, "pending");
    }

    #[test]
    fn test_paid_total_counts_paid_orders_only() {
        let orders: Vec<Order> = serde_json::from_str(
            r#"[
                {"id":1,"userId":1,"paymentStatus":"SUCCEEDED","shippingCost":5,
                 "items":[{"id":1,"productId":1,"productName":"Mug","quantity":2,"unitPrice":10.8}]},
                {"id":2,"userId":1,"paymentStatus":"PENDING","shippingCost":5,
                 "items":[{"id":2,"productId":1,"productName":"Mug","quantity":1,"unitPrice":10.8}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(paid_total(&orders, &Settings::default()).display(), "€26.60");
    }

    #[test]
    fn test_orders_listed_without_lines_keep_stored_totals() {
        let orders: Vec<Order> = serde_json::from_str(
            r#"[
                {"id":1,"userId":1,"paymentStatus":"SUCCEEDED","shippingCost":5,"totalAmount":26.6},
                {"id":2,"userId":1,"paymentStatus":"SUCCEEDED","shippingCost":5,"totalAmount":15.8}
            ]"#,
        )
        .unwrap();
        let row = OrderRow::new(&orders[0], &settings());
        assert_eq!(row.total, "€26.60");
        assert_eq!(paid_total(&orders, &settings()).display(), "€42.40");
    }

    #[test]
    fn test_pager_keeps_filters() {
        let page = Page::paginate((1..=45).collect::<Vec<_>>(), 3, 20);
        let pager = Pager::new(&page, query_prefix(&[("status", "SHIPPED"), ("q", "")]));
        assert_eq!(pager.total_pages, 3);
        assert_eq!(pager.next, None);
        assert_eq!(pager.prev, Some(2));
        assert_eq!(pager.query_prefix, "status=SHIPPED&");
    }
}
