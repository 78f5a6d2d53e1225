//! Type-safe price representation using decimal arithmetic.
//!
//! Unit prices are rounded to cents once, when they are computed (see
//! [`crate::pricing::unit_price`]); sums of rounded amounts stay exact.

use core::fmt;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from price arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The two amounts are in different currencies.
    #[error("cannot combine {left} and {right} amounts")]
    CurrencyMismatch {
        left: CurrencyCode,
        right: CurrencyCode,
    },
    /// The result does not fit the amount type.
    #[error("amount out of range")]
    Overflow,
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Multiply by a quantity, saturating at the largest amount.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(
            self.amount.saturating_mul(Decimal::from(quantity)),
            self.currency_code,
        )
    }

    /// Amount rounded to two decimal places, half away from zero.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Copy with the amount rounded to cents.
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self::new(self.rounded(), self.currency_code)
    }

    /// Amount in minor units (cents), as payment providers expect.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the amount does not fit an `i64`.
    pub fn minor_units(&self) -> Result<i64, PriceError> {
        self.rounded()
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| i64::try_from(cents).ok())
            .ok_or(PriceError::Overflow)
    }

    /// Add two prices in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::CurrencyMismatch`] for mixed currencies and
    /// [`PriceError::Overflow`] when the sum is out of range.
    pub fn checked_add(self, rhs: Self) -> Result<Self, PriceError> {
        if self.currency_code != rhs.currency_code {
            return Err(PriceError::CurrencyMismatch {
                left: self.currency_code,
                right: rhs.currency_code,
            });
        }
        self.amount
            .checked_add(rhs.amount)
            .map(|amount| Self::new(amount, self.currency_code))
            .ok_or(PriceError::Overflow)
    }

    /// Format for display (e.g., "€19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Saturating addition for totals built from the store's single currency.
/// Use [`Price::checked_add`] when either side comes from outside input.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency_code, rhs.currency_code);
        Self::new(self.amount.saturating_add(rhs.amount), self.currency_code)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Currency symbol used in price displays.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }

    /// All supported currencies, for settings forms.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::EUR, Self::USD, Self::GBP, Self::CAD, Self::AUD]
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let price = Price::new(dec("10.805"), CurrencyCode::EUR);
        assert_eq!(price.display(), "€10.81");

        let price = Price::new(dec("10.8"), CurrencyCode::EUR);
        assert_eq!(price.display(), "€10.80");
    }

    #[test]
    fn test_display_symbols() {
        assert_eq!(Price::new(dec("5"), CurrencyCode::USD).display(), "$5.00");
        assert_eq!(Price::new(dec("5"), CurrencyCode::GBP).display(), "£5.00");
    }

    #[test]
    fn test_times_and_add() {
        let unit = Price::new(dec("10.80"), CurrencyCode::EUR);
        let total = unit.times(3) + Price::new(dec("4.99"), CurrencyCode::EUR);
        assert_eq!(total.amount, dec("37.39"));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Price::new(dec("10.8"), CurrencyCode::EUR).minor_units(), Ok(1080));
        assert_eq!(Price::new(dec("0.005"), CurrencyCode::EUR).minor_units(), Ok(1));
    }

    #[test]
    fn test_minor_units_out_of_range() {
        let huge = Price::new(Decimal::MAX, CurrencyCode::EUR);
        assert_eq!(huge.minor_units(), Err(PriceError::Overflow));
    }

    #[test]
    fn test_checked_add() {
        let eur = Price::new(dec("1.10"), CurrencyCode::EUR);
        assert_eq!(eur.checked_add(eur).unwrap().amount, dec("2.20"));
        assert_eq!(
            eur.checked_add(Price::new(dec("1"), CurrencyCode::USD)),
            Err(PriceError::CurrencyMismatch {
                left: CurrencyCode::EUR,
                right: CurrencyCode::USD,
            })
        );
        let max = Price::new(Decimal::MAX, CurrencyCode::EUR);
        assert_eq!(max.checked_add(eur), Err(PriceError::Overflow));
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
