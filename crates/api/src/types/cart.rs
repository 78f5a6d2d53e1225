//! Shopping cart as returned by `GET /api/cart`.

use printloom_core::{CartItemId, LineAmount, OrderTotals, Price, ProductId};
use serde::{Deserialize, Serialize};

use super::{Product, Settings};

/// Personalisation attached to a cart line or order item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Customization {
    /// `None` when neither text nor image was given.
    #[must_use]
    pub fn non_empty(text: Option<String>, image_url: Option<String>) -> Option<Self> {
        let text = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        if text.is_none() && image_url.is_none() {
            None
        } else {
            Some(Self { text, image_url })
        }
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
    #[serde(default)]
    pub customization: Option<Customization>,
}

impl CartItem {
    /// Price for one unit, tax and discount applied.
    #[must_use]
    pub fn unit_price(&self, settings: &Settings) -> Price {
        self.product.unit_price(settings)
    }

    /// The line as a pricing input.
    #[must_use]
    pub fn line(&self, settings: &Settings) -> LineAmount {
        LineAmount::new(self.unit_price(settings), self.quantity)
    }
}

/// The signed-in user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// All lines as pricing inputs.
    #[must_use]
    pub fn lines(&self, settings: &Settings) -> Vec<LineAmount> {
        self.items.iter().map(|item| item.line(settings)).collect()
    }

    /// Subtotal, shipping and total for the cart.
    #[must_use]
    pub fn totals(&self, settings: &Settings) -> OrderTotals {
        OrderTotals::compute(&self.lines(settings), settings.shipping())
    }
}

/// `POST /api/cart` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CART: &str = r#"{
        "items": [
            {
                "id": 7,
                "product": {"id": 1, "name": "Mug", "basePrice": 10, "onSale": true, "discountPercentage": 10},
                "quantity": 2,
                "customization": {"text": "Hi Mum", "imageUrl": "/uploads/a.png"}
            },
            {
                "id": 8,
                "product": {"id": 2, "name": "Tee", "basePrice": 5},
                "quantity": 1
            }
        ]
    }"#;

    fn settings() -> Settings {
        Settings {
            shipping_cost: "4.99".parse().unwrap(),
            tax_rate: "0.2".parse().unwrap(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart: Cart = serde_json::from_str(CART).unwrap();
        let totals = cart.totals(&settings());

        // 2 × 10.80 + 1 × 6.00
        assert_eq!(totals.subtotal.display(), "€27.60");
        assert_eq!(totals.shipping.display(), "€4.99");
        assert_eq!(totals.total.display(), "€32.59");
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_customization_parsed() {
        let cart: Cart = serde_json::from_str(CART).unwrap();
        let custom = cart.items[0].customization.as_ref().unwrap();
        assert_eq!(custom.text.as_deref(), Some("Hi Mum"));
        assert!(cart.items[1].customization.is_none());
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart: Cart = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.totals(&settings()).total.display(), "€0.00");
    }

    #[test]
    fn test_customization_non_empty() {
        assert!(Customization::non_empty(Some("  ".to_string()), None).is_none());
        let c = Customization::non_empty(Some(" Ada ".to_string()), None).unwrap();
        assert_eq!(c.text.as_deref(), Some("Ada"));
    }
}
