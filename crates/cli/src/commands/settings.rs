//! `pl-cli settings show`

use url::Url;

use super::{CliError, client};

/// Print shipping cost, tax rate and currency.
///
/// # Errors
///
/// Returns the backend error if settings cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn show(backend_url: &Url) -> Result<(), CliError> {
    let settings = client(backend_url)?.get_settings().await?;
    println!("Shipping:  {}", settings.shipping().display());
    println!("Tax rate:  {}%", settings.tax_rate().as_percent());
    println!("Currency:  {}", settings.currency);
    Ok(())
}
