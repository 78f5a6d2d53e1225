//! Store settings route handlers.
//!
//! The tax rate is entered as a percentage and stored as a fraction.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Redirect, Response},
    routing::get,
};
use printloom_api::Settings;
use printloom_core::{CurrencyCode, TaxRate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    flash::{Flash, set_flash, take_flash},
    middleware::RequireAdminAuth,
    state::AppState,
    views::{AdminUserView, SelectOption},
};

use super::render;

/// Settings page template.
#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub shipping_cost: String,
    pub tax_percent: String,
    pub currencies: Vec<SelectOption>,
}

/// Settings form fields.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub shipping_cost: String,
    pub tax_percent: String,
    pub currency: String,
}

impl SettingsForm {
    /// Parse the form into backend settings.
    fn validate(&self) -> std::result::Result<Settings, String> {
        let shipping_cost: Decimal = self
            .shipping_cost
            .trim()
            .parse()
            .map_err(|_| "Shipping cost must be a number.".to_string())?;
        if shipping_cost.is_sign_negative() {
            return Err("Shipping cost cannot be negative.".to_string());
        }

        let percent: Decimal = self
            .tax_percent
            .trim()
            .parse()
            .map_err(|_| "Tax rate must be a number.".to_string())?;
        let tax = TaxRate::from_percent(percent).map_err(|e| e.to_string())?;

        let currency: CurrencyCode = self
            .currency
            .parse()
            .map_err(|_| format!("Unsupported currency \"{}\".", self.currency))?;

        Ok(Settings {
            shipping_cost,
            tax_rate: tax.fraction(),
            currency,
        })
    }
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(settings_page).post(update_settings))
}

/// Settings page handler.
///
/// GET /settings
#[instrument(skip_all)]
async fn settings_page(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
) -> Result<Response> {
    let settings = state.api().get_settings().await?;
    let currency = settings.currency.code();

    Ok(render(&SettingsTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/settings".to_string(),
        flash: take_flash(&session).await,
        shipping_cost: settings.shipping_cost.normalize().to_string(),
        tax_percent: settings.tax_rate().as_percent().to_string(),
        currencies: CurrencyCode::all()
            .iter()
            .map(|c| {
                SelectOption::new(c.code(), format!("{} ({})", c.code(), c.symbol()), currency)
            })
            .collect(),
    }))
}

/// Save settings.
///
/// POST /settings
#[instrument(skip_all)]
async fn update_settings(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Form(form): Form<SettingsForm>,
) -> Redirect {
    let flash = match form.validate() {
        Err(message) => Flash::error(message),
        Ok(settings) => match state.api().update_settings(&current.backend, &settings).await {
            Ok(saved) => {
                tracing::info!(
                    tax_rate = %saved.tax_rate,
                    shipping_cost = %saved.shipping_cost,
                    currency = %saved.currency,
                    "Settings updated"
                );
                Flash::success("Settings saved.")
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to update settings");
                Flash::error(e.user_message())
            }
        },
    };
    set_flash(&session, flash).await;
    Redirect::to("/settings")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(shipping: &str, tax: &str, currency: &str) -> SettingsForm {
        SettingsForm {
            shipping_cost: shipping.to_string(),
            tax_percent: tax.to_string(),
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_tax_percent_is_stored_as_fraction() {
        let settings = form("4.99", "20", "EUR").validate().unwrap();
        assert_eq!(settings.tax_rate, "0.2".parse::<Decimal>().unwrap());
        assert_eq!(settings.shipping_cost, "4.99".parse::<Decimal>().unwrap());
        assert_eq!(settings.currency, CurrencyCode::EUR);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(form("abc", "20", "EUR").validate().is_err());
        assert!(form("-1", "20", "EUR").validate().is_err());
        assert!(form("5", "-3", "EUR").validate().is_err());
        assert!(form("5", "20", "XYZ").validate().is_err());
    }
}
