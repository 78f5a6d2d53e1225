//! `pl-cli orders list`: the admin order table in a terminal.

use printloom_api::{ApiClient, BackendSession, Order};
use printloom_core::{CurrencyCode, OrderStatus, StatusFilter};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{CliError, client};

/// List orders, newest first, as the configured admin.
///
/// Credentials come from `PRINTLOOM_ADMIN_EMAIL` and
/// `PRINTLOOM_ADMIN_PASSWORD`.
///
/// # Errors
///
/// Returns [`CliError`] on missing credentials, an unknown status, a
/// non-admin account, or a backend failure.
pub async fn list(backend_url: &Url, status: Option<&str>, search: &str) -> Result<(), CliError> {
    let filter = parse_status(status)?;
    let email = std::env::var("PRINTLOOM_ADMIN_EMAIL")
        .map_err(|_| CliError::MissingEnvVar("PRINTLOOM_ADMIN_EMAIL"))?;
    let password = SecretString::from(
        std::env::var("PRINTLOOM_ADMIN_PASSWORD")
            .map_err(|_| CliError::MissingEnvVar("PRINTLOOM_ADMIN_PASSWORD"))?,
    );

    let api = client(backend_url)?;
    let (user, session) = api.login(&email, password.expose_secret()).await?;
    if !user.is_admin() {
        sign_out(&api, &session).await;
        return Err(CliError::NotAdmin(user.email));
    }

    let result = fetch(&api, &session).await;
    sign_out(&api, &session).await;
    let (orders, currency) = result?;

    let orders = select(orders, filter, search);
    print_table(&orders, currency);
    Ok(())
}

async fn fetch(
    api: &ApiClient,
    session: &BackendSession,
) -> Result<(Vec<Order>, CurrencyCode), CliError> {
    let (orders, settings) = tokio::join!(api.list_orders(session), api.settings_or_default());
    Ok((orders?, settings.currency))
}

async fn sign_out(api: &ApiClient, session: &BackendSession) {
    if let Err(e) = api.logout(session).await {
        tracing::warn!(error = %e, "Backend logout failed");
    }
}

/// `None` and `all` mean every status; anything else must be a known status.
fn parse_status(value: Option<&str>) -> Result<StatusFilter<OrderStatus>, CliError> {
    match value.map(str::trim) {
        None | Some("") => Ok(StatusFilter::All),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(StatusFilter::All),
        Some(v) => v
            .to_ascii_uppercase()
            .parse::<OrderStatus>()
            .map(StatusFilter::Only)
            .map_err(CliError::InvalidArgument),
    }
}

fn select(mut orders: Vec<Order>, filter: StatusFilter<OrderStatus>, search: &str) -> Vec<Order> {
    orders.retain(|o| filter.matches(o.status) && o.matches_client(search));
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    orders
}

#[allow(clippy::print_stdout)]
fn print_table(orders: &[Order], currency: CurrencyCode) {
    if orders.is_empty() {
        println!("No orders match these filters.");
        return;
    }

    println!(
        "{:<8} {:<17} {:<24} {:<12} {:<10} {:>10}",
        "ORDER", "PLACED", "CUSTOMER", "STATUS", "PAYMENT", "TOTAL"
    );
    for order in orders {
        let placed = order.created_at.map_or_else(
            || "-".to_string(),
            |at| at.format("%Y-%m-%d %H:%M").to_string(),
        );
        println!(
            "{:<8} {:<17} {:<24} {:<12} {:<10} {:>10}",
            format!("#{}", order.id),
            placed,
            truncate(order.customer_name(), 24),
            order.status.label(),
            order.payment_status.label(),
            order.totals(currency).total.display(),
        );
    }
    println!("{} order(s)", orders.len());
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(id: i64, status: &str, name: &str, created: &str) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "userId": 1,
            "user": {"id": 1, "name": name, "email": format!("{}@example.com", name.to_lowercase())},
            "status": status,
            "createdAt": created,
        }))
        .unwrap()
    }

    fn sample() -> Vec<Order> {
        vec![
            order(1, "PENDING", "Ada", "2026-03-01T10:00:00Z"),
            order(2, "CANCELLED", "Grace", "2026-03-03T10:00:00Z"),
            order(3, "SHIPPED", "Ada", "2026-03-02T10:00:00Z"),
        ]
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), StatusFilter::All);
        assert_eq!(parse_status(Some("ALL")).unwrap(), StatusFilter::All);
        assert_eq!(
            parse_status(Some("cancelled")).unwrap(),
            StatusFilter::Only(OrderStatus::Cancelled)
        );
        assert!(matches!(
            parse_status(Some("LOST")),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_select_newest_first() {
        let ids: Vec<i64> = select(sample(), StatusFilter::All, "")
            .iter()
            .map(|o| o.id.as_i64())
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_select_filters_status_and_client() {
        let cancelled = select(sample(), StatusFilter::Only(OrderStatus::Cancelled), "");
        assert_eq!(cancelled.len(), 1);

        let none = select(
            sample(),
            StatusFilter::Only(OrderStatus::Cancelled),
            "nobody",
        );
        assert!(none.is_empty());

        let ada = select(sample(), StatusFilter::All, "ada@");
        assert_eq!(ada.len(), 2);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ada", 5), "Ada");
        assert_eq!(truncate("Ada Lovelace", 5), "Ada …");
    }
}
