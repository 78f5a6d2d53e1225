//! Orders and checkout payloads.

use chrono::{DateTime, Utc};
use printloom_core::{
    CurrencyCode, LineAmount, OrderId, OrderItemId, OrderStatus, OrderTotals, PaymentStatus,
    Price, ProductId, UserId, matches_search,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Customization;

/// Where an order ships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Address lines for invoices and order pages.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        [
            self.full_name.clone(),
            self.street.clone(),
            format!("{} {}", self.postal_code, self.city).trim().to_string(),
            self.country.clone(),
        ]
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect()
    }
}

/// The customer an order belongs to, as embedded in admin order lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// One line of a placed order. The unit price is fixed at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub customization: Option<Customization>,
}

impl OrderItem {
    /// The line as a pricing input.
    #[must_use]
    pub const fn line(&self, currency: CurrencyCode) -> LineAmount {
        LineAmount::new(Price::new(self.unit_price, currency), self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Totals recomputed from the stored lines and shipping cost.
    ///
    /// List endpoints may omit the lines; the stored `totalAmount` is used
    /// then.
    #[must_use]
    pub fn totals(&self, currency: CurrencyCode) -> OrderTotals {
        let shipping = Price::new(self.shipping_cost, currency);
        if self.items.is_empty() {
            return OrderTotals::from_stored(Price::new(self.total_amount, currency), shipping);
        }
        let lines: Vec<LineAmount> = self.items.iter().map(|i| i.line(currency)).collect();
        OrderTotals::compute(&lines, shipping)
    }

    /// Total units ordered.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Customer name, falling back to the shipping name.
    #[must_use]
    pub fn customer_name(&self) -> &str {
        self.user
            .as_ref()
            .map_or(self.shipping_address.full_name.as_str(), |u| u.name.as_str())
    }

    /// Customer email, if the backend embedded the user.
    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }

    /// Whether the search term matches the client's name or email.
    #[must_use]
    pub fn matches_client(&self, term: &str) -> bool {
        matches_search(
            [
                Some(self.customer_name()),
                self.customer_email(),
                Some(self.shipping_address.full_name.as_str()),
            ]
            .into_iter()
            .flatten(),
            term,
        )
    }
}

/// One line of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

/// `POST /api/orders` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub shipping_cost: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_amount: Decimal,
}

impl NewOrder {
    /// Build an order from the cart at current prices.
    #[must_use]
    pub fn from_cart(
        cart: &super::Cart,
        settings: &super::Settings,
        shipping_address: ShippingAddress,
    ) -> Self {
        let totals = cart.totals(settings);
        Self {
            items: cart
                .items
                .iter()
                .map(|item| NewOrderItem {
                    product_id: item.product.id,
                    quantity: item.quantity,
                    unit_price: item.unit_price(settings).rounded(),
                    customization: item.customization.clone(),
                })
                .collect(),
            shipping_address,
            shipping_cost: totals.shipping.rounded(),
            total_amount: totals.total.rounded(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{Cart, Settings};

    const ORDER: &str = r#"{
        "id": 12,
        "userId": 4,
        "user": {"id": 4, "name": "Ada Lovelace", "email": "ada@example.com"},
        "items": [
            {"id": 1, "productId": 1, "productName": "Mug", "quantity": 2, "unitPrice": 10.8},
            {"id": 2, "productId": 2, "productName": "Tee", "quantity": 1, "unitPrice": 6}
        ],
        "status": "CANCELLED",
        "paymentStatus": "SUCCEEDED",
        "shippingCost": 4.99,
        "totalAmount": 32.59,
        "shippingAddress": {"fullName": "Ada L.", "street": "1 Loop Rd", "city": "London", "postalCode": "N1", "country": "UK"},
        "createdAt": "2025-04-02T09:30:00Z"
    }"#;

    #[test]
    fn test_order_totals() {
        let order: Order = serde_json::from_str(ORDER).unwrap();
        let totals = order.totals(CurrencyCode::EUR);
        assert_eq!(totals.subtotal.display(), "€27.60");
        assert_eq!(totals.total.display(), "€32.59");
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_order_without_lines_uses_stored_total() {
        let order: Order = serde_json::from_str(
            r#"{"id":3,"userId":4,"shippingCost":4.99,"totalAmount":32.59}"#,
        )
        .unwrap();
        let totals = order.totals(CurrencyCode::EUR);
        assert_eq!(totals.total.display(), "€32.59");
        assert_eq!(totals.shipping.display(), "€4.99");
        assert_eq!(totals.subtotal.display(), "€27.60");
    }

    #[test]
    fn test_cart_order_and_stored_order_agree() {
        // 1.99 plus 21% tax is shown as €2.41 a unit.
        let cart: Cart = serde_json::from_str(
            r#"{"items":[{"id":1,"product":{"id":5,"name":"Sticker","basePrice":1.99},"quantity":3}]}"#,
        )
        .unwrap();
        let settings = Settings {
            tax_rate: "0.21".parse().unwrap(),
            ..Settings::default()
        };
        let cart_totals = cart.totals(&settings);
        assert_eq!(cart.items[0].unit_price(&settings).display(), "€2.41");
        assert_eq!(cart_totals.subtotal.display(), "€7.23");

        let new_order = NewOrder::from_cart(&cart, &settings, ShippingAddress::default());
        assert_eq!(new_order.total_amount, cart_totals.total.amount);

        let stored = Order {
            id: OrderId::new(9),
            user_id: UserId::new(4),
            user: None,
            items: new_order
                .items
                .iter()
                .enumerate()
                .map(|(n, item)| OrderItem {
                    id: OrderItemId::new(i64::try_from(n).unwrap()),
                    product_id: item.product_id,
                    product_name: "Sticker".to_string(),
                    image_url: None,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    customization: None,
                })
                .collect(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_cost: new_order.shipping_cost,
            total_amount: new_order.total_amount,
            shipping_address: ShippingAddress::default(),
            created_at: None,
        };
        let order_totals = stored.totals(settings.currency);
        assert_eq!(order_totals.total, cart_totals.total);
        assert_eq!(order_totals.total.minor_units(), Ok(723));
    }

    #[test]
    fn test_matches_client() {
        let order: Order = serde_json::from_str(ORDER).unwrap();
        assert!(order.matches_client("lovelace"));
        assert!(order.matches_client("ADA@EXAMPLE"));
        assert!(order.matches_client(""));
        assert!(!order.matches_client("turing"));
    }

    #[test]
    fn test_customer_name_falls_back_to_shipping() {
        let mut order: Order = serde_json::from_str(ORDER).unwrap();
        order.user = None;
        assert_eq!(order.customer_name(), "Ada L.");
        assert!(order.customer_email().is_none());
    }

    #[test]
    fn test_new_order_from_cart() {
        let cart: Cart = serde_json::from_str(
            r#"{"items":[{"id":7,"product":{"id":1,"name":"Mug","basePrice":10,"onSale":true,"discountPercentage":10},"quantity":2}]}"#,
        )
        .unwrap();
        let settings = Settings {
            shipping_cost: "4.99".parse().unwrap(),
            tax_rate: "0.2".parse().unwrap(),
            ..Settings::default()
        };
        let order = NewOrder::from_cart(&cart, &settings, ShippingAddress::default());
        assert_eq!(order.items[0].unit_price, "10.80".parse::<Decimal>().unwrap());
        assert_eq!(order.total_amount, "26.59".parse::<Decimal>().unwrap());

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["items"][0]["productId"], 1);
        assert_eq!(json["totalAmount"], serde_json::json!(26.59));
    }

    #[test]
    fn test_address_lines_skip_blanks() {
        let address = ShippingAddress {
            full_name: "Ada".to_string(),
            city: "London".to_string(),
            ..ShippingAddress::default()
        };
        assert_eq!(address.lines(), vec!["Ada".to_string(), "London".to_string()]);
    }
}
