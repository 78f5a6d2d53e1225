//! Price arithmetic shared by every page that shows money.
//!
//! The store-wide tax rate is applied to a product's base price first; an
//! active product discount is then applied to the tax-inclusive amount:
//!
//! ```text
//! unit = round₂(base × (1 + tax_rate) × (1 − discount_percent / 100))
//! ```
//!
//! The unit price is rounded to cents once, so the price a customer sees is
//! the price every total is built from. Cart and order totals sum
//! `unit × quantity` over the lines and add the flat shipping cost once.
//!
//! ```rust
//! use printloom_core::{CurrencyCode, Discount, Price, TaxRate, pricing};
//! use rust_decimal::Decimal;
//!
//! let base = Price::new(Decimal::from(10), CurrencyCode::EUR);
//! let tax = TaxRate::from_percent(Decimal::from(20)).unwrap();
//! let discount = Discount::new(Decimal::from(10)).unwrap();
//!
//! assert_eq!(pricing::unit_price(base, tax, Some(discount)).display(), "€10.80");
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{CurrencyCode, Price};

/// Errors raised when building pricing inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Tax rates below zero make no sense for a shop.
    #[error("tax rate cannot be negative (got {0})")]
    NegativeTaxRate(Decimal),
    /// Discounts are percentages between 0 and 100.
    #[error("discount must be between 0 and 100 percent (got {0})")]
    DiscountOutOfRange(Decimal),
}

/// Store-wide tax rate, held as a fraction (`0.20` is 20%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// No tax.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Build from a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeTaxRate`] for negative input.
    pub fn new(fraction: Decimal) -> Result<Self, PricingError> {
        if fraction.is_sign_negative() && !fraction.is_zero() {
            return Err(PricingError::NegativeTaxRate(fraction));
        }
        Ok(Self(fraction))
    }

    /// Build from a percentage (`20` is 20%).
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeTaxRate`] for negative input.
    pub fn from_percent(percent: Decimal) -> Result<Self, PricingError> {
        Self::new(percent / Decimal::ONE_HUNDRED)
    }

    /// The rate as a fraction.
    #[must_use]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// The rate as a percentage, without trailing zeros.
    #[must_use]
    pub fn as_percent(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }
}

/// A product-level markdown in percent (`10` is 10% off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Discount(Decimal);

impl Discount {
    /// Build a discount.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::DiscountOutOfRange`] outside `0..=100`.
    pub fn new(percent: Decimal) -> Result<Self, PricingError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(PricingError::DiscountOutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// The discount that applies to a product, if any.
    ///
    /// Only products flagged as on sale with a positive, in-range percentage
    /// get a discount.
    #[must_use]
    pub fn for_product(on_sale: bool, percent: Option<Decimal>) -> Option<Self> {
        if !on_sale {
            return None;
        }
        percent
            .filter(|p| *p > Decimal::ZERO)
            .and_then(|p| Self::new(p).ok())
    }

    /// The discount in percent.
    #[must_use]
    pub fn percent(&self) -> Decimal {
        self.0.normalize()
    }
}

/// Apply the store tax rate to a base price.
#[must_use]
pub fn tax_inclusive(base: Price, tax: TaxRate) -> Price {
    Price::new(base.amount * (Decimal::ONE + tax.0), base.currency_code)
}

/// Apply a discount to an already tax-inclusive price.
#[must_use]
pub fn apply_discount(price: Price, discount: Discount) -> Price {
    let factor = Decimal::ONE - discount.0 / Decimal::ONE_HUNDRED;
    Price::new(price.amount * factor, price.currency_code)
}

/// The price a customer pays for one unit, rounded to cents.
#[must_use]
pub fn unit_price(base: Price, tax: TaxRate, discount: Option<Discount>) -> Price {
    let taxed = tax_inclusive(base, tax);
    let unit = match discount {
        Some(discount) => apply_discount(taxed, discount),
        None => taxed,
    };
    unit.round_to_cents()
}

/// One line of a cart or order: a unit price and a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    /// Final unit price, discount already applied.
    pub unit: Price,
    /// Number of units.
    pub quantity: u32,
}

impl LineAmount {
    /// Create a line.
    #[must_use]
    pub const fn new(unit: Price, quantity: u32) -> Self {
        Self { unit, quantity }
    }

    /// `unit × quantity`.
    #[must_use]
    pub fn total(&self) -> Price {
        self.unit.times(self.quantity)
    }
}

/// Sum of `unit × quantity` over all lines.
#[must_use]
pub fn cart_total(lines: &[LineAmount], currency: CurrencyCode) -> Price {
    lines
        .iter()
        .fold(Price::zero(currency), |acc, line| acc + line.total())
}

/// Totals shown on the cart, checkout and invoice pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    /// Sum of line totals.
    pub subtotal: Price,
    /// Flat shipping cost; zero for an empty cart.
    pub shipping: Price,
    /// Subtotal plus shipping.
    pub total: Price,
    /// Total number of units.
    pub item_count: u32,
}

impl OrderTotals {
    /// Totals for an order whose lines are not at hand, from the stored
    /// grand total and shipping cost.
    #[must_use]
    pub fn from_stored(total: Price, shipping: Price) -> Self {
        let subtotal = total
            .amount
            .checked_sub(shipping.amount)
            .unwrap_or_default()
            .max(Decimal::ZERO);
        Self {
            subtotal: Price::new(subtotal, total.currency_code),
            shipping,
            total,
            item_count: 0,
        }
    }

    /// Compute totals for a set of lines.
    #[must_use]
    pub fn compute(lines: &[LineAmount], shipping: Price) -> Self {
        let currency = shipping.currency_code;
        let subtotal = cart_total(lines, currency);
        let item_count = lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity));
        let shipping = if item_count == 0 {
            Price::zero(currency)
        } else {
            shipping
        };

        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
            item_count,
        }
    }
}
