//! Catalog products.

use chrono::{DateTime, Utc};
use printloom_core::{Discount, Price, ProductId, pricing};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Settings;

/// A product in the catalog.
///
/// `base_price` is before tax. Prices shown to shoppers always come from
/// [`Product::unit_price`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub customizable: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The active discount, if the product is on sale.
    #[must_use]
    pub fn discount(&self) -> Option<Discount> {
        Discount::for_product(self.on_sale, self.discount_percentage)
    }

    /// Base price in the store currency.
    #[must_use]
    pub const fn base(&self, settings: &Settings) -> Price {
        Price::new(self.base_price, settings.currency)
    }

    /// Tax-inclusive price before any discount.
    #[must_use]
    pub fn tax_inclusive_price(&self, settings: &Settings) -> Price {
        pricing::tax_inclusive(self.base(settings), settings.tax_rate())
    }

    /// What a shopper pays for one unit.
    #[must_use]
    pub fn unit_price(&self, settings: &Settings) -> Price {
        pricing::unit_price(self.base(settings), settings.tax_rate(), self.discount())
    }
}

/// Body for `POST /api/products` and `PUT /api/products/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub base_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub on_sale: bool,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub discount_percentage: Option<Decimal>,
    pub customizable: bool,
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            base_price: product.base_price,
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            on_sale: product.on_sale,
            discount_percentage: product.discount_percentage,
            customizable: product.customizable,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(json: &str) -> Product {
        serde_json::from_str(json).unwrap()
    }

    fn settings(tax: &str) -> Settings {
        Settings {
            tax_rate: tax.parse().unwrap(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_unit_price_with_sale() {
        let p = product(
            r#"{"id":1,"name":"Mug","basePrice":10,"onSale":true,"discountPercentage":10}"#,
        );
        let s = settings("0.2");
        assert_eq!(p.tax_inclusive_price(&s).display(), "€12.00");
        assert_eq!(p.unit_price(&s).display(), "€10.80");
    }

    #[test]
    fn test_discount_ignored_when_not_on_sale() {
        let p = product(
            r#"{"id":1,"name":"Mug","basePrice":"10.00","onSale":false,"discountPercentage":50}"#,
        );
        assert!(p.discount().is_none());
        assert_eq!(p.unit_price(&settings("0")).display(), "€10.00");
    }

    #[test]
    fn test_product_input_serializes_numbers() {
        let input = ProductInput {
            name: "Tee".to_string(),
            base_price: "19.99".parse().unwrap(),
            discount_percentage: Some(Decimal::from(15)),
            ..ProductInput::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["basePrice"], serde_json::json!(19.99));
        assert_eq!(json["discountPercentage"], serde_json::json!(15.0));
        assert!(json.get("imageUrl").is_none());
    }
}
