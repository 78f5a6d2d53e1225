//! Store-wide settings.

use printloom_core::{CurrencyCode, Price, TaxRate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shipping cost, tax rate and currency applied to every price display.
///
/// `tax_rate` is a fraction (`0.20` is 20%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub shipping_cost: Decimal,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shipping_cost: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            currency: CurrencyCode::EUR,
        }
    }
}

impl Settings {
    /// The tax rate; a negative value from the backend counts as no tax.
    #[must_use]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::new(self.tax_rate).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring invalid tax rate from settings");
            TaxRate::ZERO
        })
    }

    /// Flat shipping cost per order.
    #[must_use]
    pub const fn shipping(&self) -> Price {
        Price::new(self.shipping_cost, self.currency)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.tax_rate(), TaxRate::ZERO);
        assert_eq!(settings.shipping().display(), "€0.00");
    }

    #[test]
    fn test_settings_from_numbers() {
        let settings: Settings =
            serde_json::from_str(r#"{"shippingCost":4.99,"taxRate":0.2,"currency":"EUR"}"#)
                .unwrap();
        assert_eq!(settings.tax_rate().as_percent(), Decimal::from(20));
        assert_eq!(settings.shipping().display(), "€4.99");
    }

    #[test]
    fn test_settings_serializes_numbers() {
        let settings = Settings {
            shipping_cost: "3.5".parse().unwrap(),
            tax_rate: "0.21".parse().unwrap(),
            currency: CurrencyCode::GBP,
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["shippingCost"], serde_json::json!(3.5));
        assert_eq!(json["taxRate"], serde_json::json!(0.21));
        assert_eq!(json["currency"], "GBP");
    }

    #[test]
    fn test_negative_tax_counts_as_zero() {
        let settings = Settings {
            tax_rate: "-0.1".parse().unwrap(),
            ..Settings::default()
        };
        assert_eq!(settings.tax_rate(), TaxRate::ZERO);
    }
}
