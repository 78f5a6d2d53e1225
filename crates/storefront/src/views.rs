//! View models shared by several pages.
//!
//! Templates only print strings; every price is computed here through
//! `printloom_core::pricing` with the current store settings.

use printloom_api::{ApiClient, Order, OrderChangeRequest, Product, Settings};
use printloom_core::{ChangeRequestStatus, OrderStatus, Page, PaymentStatus};

/// A product as shown in grids and carousels.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub description: String,
    pub image_url: Option<String>,
    /// Tax-inclusive price after any discount.
    pub price: String,
    /// Tax-inclusive price before the discount, when on sale.
    pub original_price: Option<String>,
    /// e.g. "-10%".
    pub discount_badge: Option<String>,
    pub customizable: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, settings: &Settings, api: &ApiClient) -> Self {
        let discount = product.discount();
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            image_url: product.image_url.as_deref().map(|url| api.asset_url(url)),
            price: product.unit_price(settings).display(),
            original_price: discount.map(|_| product.tax_inclusive_price(settings).display()),
            discount_badge: discount.map(|d| format!("-{}%", d.percent().normalize())),
            customizable: product.customizable,
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

/// A numbered page link.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

/// Pagination controls.
///
/// `query_prefix` carries the other query parameters (already encoded and
/// ending in `&` when non-empty) so links keep the active filters.
#[derive(Debug, Clone)]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub links: Vec<PageLink>,
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

    /// Whether there is more than one page to navigate.
    #[must_use]
    pub const fn is_needed(&self) -> bool {
        self.total_pages > 1
    }
}

/// Build a query prefix from non-empty parameters, e.g. `q=mug&sort=price&`.
#[must_use]
pub fn query_prefix(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={}&", urlencoding::encode(value)))
        .collect()
}

/// CSS modifier for an order status badge.
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

/// CSS modifier for a payment status badge.
#[must_use]
pub const fn payment_status_class(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Succeeded => "paid",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Refunded => "refunded",
    }
}

/// A row in an order list.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i64,
    pub date: String,
    pub status: String,
    pub status_class: &'static str,
    pub payment: String,
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
            status: order.status.label().to_string(),
            status_class: order_status_class(order.status),
            payment: order.payment_status.label().to_string(),
            payment_class: payment_status_class(order.payment_status),
            item_count: order.item_count(),
            total: order.totals(settings.currency).total.display(),
        }
    }
}

/// One order line for display.
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

/// A full order for the detail and invoice pages.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub id: i64,
    pub date: String,
    pub status: String,
    pub status_class: &'static str,
    pub payment: String,
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
    /// Totals are recomputed from the stored lines, so the invoice always
    /// adds up.
    #[must_use]
    pub fn new(order: &Order, settings: &Settings, api: &ApiClient) -> Self {
        let currency = settings.currency;
        let totals = order.totals(currency);
        Self {
            id: order.id.as_i64(),
            date: format_date(order.created_at),
            status: order.status.label().to_string(),
            status_class: order_status_class(order.status),
            payment: order.payment_status.label().to_string(),
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

/// A change request as shown under its order.
#[derive(Debug, Clone)]
pub struct ChangeRequestView {
    pub id: i64,
    pub order_id: i64,
    pub kind: &'static str,
    pub message: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub admin_response: Option<String>,
    pub date: String,
}

impl From<&OrderChangeRequest> for ChangeRequestView {
    fn from(request: &OrderChangeRequest) -> Self {
        Self {
            id: request.id.as_i64(),
            order_id: request.order_id.as_i64(),
            kind: request.kind.label(),
            message: request.message.clone(),
            status: request.status.label(),
            status_class: match request.status {
                ChangeRequestStatus::Pending => "pending",
                ChangeRequestStatus::Approved => "approved",
                ChangeRequestStatus::Rejected => "rejected",
            },
            admin_response: request.admin_response.clone(),
            date: format_date(request.created_at),
        }
    }
}

/// Format an optional timestamp as a date, e.g. "2 Apr 2025".
#[must_use]
pub fn format_date(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.format("%-d %b %Y").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
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
    fn test_product_card_on_sale() {
        let product: Product = serde_json::from_str(
            r#"{"id":1,"name":"Mug","basePrice":10,"onSale":true,"discountPercentage":10,"imageUrl":"/uploads/mug.png"}"#,
        )
        .unwrap();
        let card = ProductCard::new(&product, &settings(), &api());
        assert_eq!(card.price, "€10.80");
        assert_eq!(card.original_price.as_deref(), Some("€12.00"));
        assert_eq!(card.discount_badge.as_deref(), Some("-10%"));
        assert_eq!(
            card.image_url.as_deref(),
            Some("http://localhost:4000/uploads/mug.png")
        );
    }

    #[test]
    fn test_product_card_full_price() {
        let product: Product =
            serde_json::from_str(r#"{"id":2,"name":"Tee","basePrice":5}"#).unwrap();
        let card = ProductCard::new(&product, &settings(), &api());
        assert_eq!(card.price, "€6.00");
        assert!(card.original_price.is_none());
        assert!(card.discount_badge.is_none());
    }

    #[test]
    fn test_pager_links() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 2, 12);
        let pager = Pager::new(&page, query_prefix(&[("q", "blue mug"), ("category", "")]));
        assert_eq!(pager.total_pages, 3);
        assert_eq!(pager.prev, Some(1));
        assert_eq!(pager.next, Some(3));
        assert!(pager.links.iter().any(|l| l.number == 2 && l.current));
        assert_eq!(pager.query_prefix, "q=blue%20mug&");
    }

    #[test]
    fn test_order_detail_totals() {
        let order: Order = serde_json::from_str(
            r#"{"id":12,"userId":4,"status":"SHIPPED","paymentStatus":"SUCCEEDED","shippingCost":4.99,
                "items":[{"id":1,"productId":1,"productName":"Mug","quantity":2,"unitPrice":10.8,"customization":{"text":"Hi"}}],
                "shippingAddress":{"fullName":"Ada","street":"1 Loop Rd","city":"London","postalCode":"N1","country":"UK"},
                "createdAt":"2025-04-02T09:30:00Z"}"#,
        )
        .unwrap();
        let view = OrderDetailView::new(&order, &settings(), &api());
        assert_eq!(view.items[0].line_total, "€21.60");
        assert_eq!(view.total, "€26.59");
        assert_eq!(view.date, "2 Apr 2025");
        assert_eq!(view.status, "Shipped");
        assert_eq!(view.address_lines[2], "N1 London");
    }

    #[test]
    fn test_order_row_without_lines_uses_stored_total() {
        let order: Order = serde_json::from_str(
            r#"{"id":12,"userId":4,"status":"PENDING","shippingCost":4.99,"totalAmount":26.59}"#,
        )
        .unwrap();
        let row = OrderRow::new(&order, &settings());
        assert_eq!(row.total, "€26.59");
        assert_eq!(row.item_count, 0);
    }

    #[test]
    fn test_select_option_marks_current() {
        let option = SelectOption::new("price_asc", "Price: low to high", "price_asc");
        assert!(option.selected);
        assert!(!SelectOption::new("newest", "Newest", "price_asc").selected);
    }
}
