//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use printloom_api::Product;
use tracing::instrument;

use crate::filters;
use crate::layout::Layout;
use crate::state::AppState;
use crate::views::ProductCard;

/// Products shown in the offers carousel.
const MAX_OFFERS: usize = 6;

/// Products shown under "New in".
const MAX_NEWEST: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub offers: Vec<ProductCard>,
    pub newest: Vec<ProductCard>,
    pub catalog_unavailable: bool,
}

/// On-sale products, biggest discount first.
fn offers(products: &[Product]) -> Vec<&Product> {
    let mut offers: Vec<&Product> = products.iter().filter(|p| p.discount().is_some()).collect();
    offers.sort_by(|a, b| b.discount().cmp(&a.discount()));
    offers.truncate(MAX_OFFERS);
    offers
}

/// Most recently created products.
fn newest(products: &[Product]) -> Vec<&Product> {
    let mut newest: Vec<&Product> = products.iter().collect();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    newest.truncate(MAX_NEWEST);
    newest
}

/// Display the home page.
#[instrument(skip(state, layout))]
pub async fn home(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let (products, settings) =
        tokio::join!(state.api().list_products(), state.api().settings_or_default());

    let (products, catalog_unavailable) = match products {
        Ok(products) => (products, false),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load catalog for home page");
            (std::sync::Arc::default(), true)
        }
    };

    let card = |p: &&Product| ProductCard::new(p, &settings, state.api());

    HomeTemplate {
        offers: offers(&products).iter().map(card).collect(),
        newest: newest(&products).iter().map(card).collect(),
        catalog_unavailable,
        layout,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        serde_json::from_str(
            r#"[
                {"id":1,"name":"Mug","basePrice":10,"onSale":true,"discountPercentage":10,"createdAt":"2025-01-01T00:00:00Z"},
                {"id":2,"name":"Tee","basePrice":15,"onSale":true,"discountPercentage":25,"createdAt":"2025-03-01T00:00:00Z"},
                {"id":3,"name":"Tote","basePrice":8,"onSale":false,"discountPercentage":50,"createdAt":"2025-02-01T00:00:00Z"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_offers_only_active_discounts_biggest_first() {
        let products = catalog();
        let offers = offers(&products);
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].name, "Tee");
        assert_eq!(offers[1].name, "Mug");
    }

    #[test]
    fn test_newest_first() {
        let products = catalog();
        let names: Vec<&str> = newest(&products).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Tee", "Tote", "Mug"]);
    }
}
