//! `pl-cli quote`: the storefront price arithmetic, offline.

use printloom_core::{CurrencyCode, Discount, LineAmount, Price, TaxRate, pricing};
use rust_decimal::Decimal;

use super::CliError;

/// A computed quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub tax_inclusive: Price,
    pub unit: Price,
    pub quantity: u32,
    pub total: Price,
}

/// Price `quantity` units of a product.
///
/// # Errors
///
/// Returns [`CliError`] for a negative base or tax rate, a discount outside
/// 0-100, or an unknown currency.
pub fn quote(
    base: Decimal,
    tax_rate: Decimal,
    discount: Option<Decimal>,
    quantity: u32,
    currency: &str,
) -> Result<Quote, CliError> {
    if base.is_sign_negative() {
        return Err(CliError::InvalidArgument(format!(
            "base price cannot be negative (got {base})"
        )));
    }
    let currency: CurrencyCode = currency.parse().map_err(CliError::InvalidArgument)?;
    let tax = TaxRate::new(tax_rate)?;
    let discount = discount.map(Discount::new).transpose()?;

    let base = Price::new(base, currency);
    let unit = pricing::unit_price(base, tax, discount);
    Ok(Quote {
        tax_inclusive: pricing::tax_inclusive(base, tax),
        unit,
        quantity,
        total: LineAmount::new(unit, quantity).total(),
    })
}

/// Print a quote.
#[allow(clippy::print_stdout)]
pub fn print(quote: &Quote) {
    println!("Incl. tax:   {}", quote.tax_inclusive.display());
    println!("Unit price:  {}", quote.unit.display());
    println!("Quantity:    {}", quote.quantity);
    println!("Line total:  {}", quote.total.display());
}
