//! Product route handlers.
//!
//! The backend returns the whole catalog; search, filters, sorting and
//! pagination happen here on the cached list.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use printloom_api::{ApiError, Product, Settings};
use printloom_core::{Page, ProductId, matches_search};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::layout::Layout;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::views::{Pager, ProductCard, SelectOption, query_prefix};

/// Products per catalog page.
pub const PRODUCTS_PER_PAGE: usize = 12;

/// Catalog sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl SortOrder {
    const ALL: [Self; 4] = [Self::Newest, Self::PriceAsc, Self::PriceDesc, Self::Name];

    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or_default() {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "name" => Self::Name,
            _ => Self::Newest,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub on_sale: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
}

impl CatalogQuery {
    fn search(&self) -> &str {
        self.q.as_deref().unwrap_or_default().trim()
    }

    fn category(&self) -> &str {
        self.category.as_deref().unwrap_or_default().trim()
    }

    fn on_sale_only(&self) -> bool {
        matches!(self.on_sale.as_deref(), Some("1" | "true" | "on"))
    }
}

/// Filter and sort the catalog.
#[must_use]
pub fn filter_catalog<'a>(
    products: &'a [Product],
    query: &CatalogQuery,
    settings: &Settings,
) -> Vec<&'a Product> {
    let category = query.category();
    let mut matches: Vec<&Product> = products
        .iter()
        .filter(|p| {
            matches_search(
                [
                    p.name.as_str(),
                    p.description.as_str(),
                    p.category.as_deref().unwrap_or_default(),
                ],
                query.search(),
            )
        })
        .filter(|p| {
            category.is_empty()
                || p.category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
        })
        .filter(|p| !query.on_sale_only() || p.discount().is_some())
        .collect();

    match SortOrder::parse(query.sort.as_deref()) {
        SortOrder::Newest => {
            matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        }
        SortOrder::PriceAsc => {
            matches.sort_by_key(|p| p.unit_price(settings).amount);
        }
        SortOrder::PriceDesc => {
            matches.sort_by_key(|p| std::cmp::Reverse(p.unit_price(settings).amount));
        }
        SortOrder::Name => {
            matches.sort_by_key(|p| p.name.to_lowercase());
        }
    }
    matches
}

/// Distinct categories (case-insensitive), alphabetically.
fn categories(products: &[Product]) -> Vec<String> {
    let mut seen = BTreeMap::new();
    for category in products
        .iter()
        .filter_map(|p| p.category.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        seen.entry(category.to_lowercase())
            .or_insert_with(|| category.to_string());
    }
    seen.into_values().collect()
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub search: String,
    pub on_sale_only: bool,
    pub categories: Vec<SelectOption>,
    pub sort_options: Vec<SelectOption>,
    pub pager: Pager,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductCard,
    pub description: String,
    pub is_favorite: bool,
}

/// Display the catalog.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<CatalogQuery>,
) -> Result<Response> {
    let (products, settings) =
        tokio::join!(state.api().list_products(), state.api().settings_or_default());
    let products = products?;

    let filtered: Vec<ProductCard> = filter_catalog(&products, &query, &settings)
        .into_iter()
        .map(|p| ProductCard::new(p, &settings, state.api()))
        .collect();
    let page = Page::paginate(filtered, query.page.unwrap_or(1), PRODUCTS_PER_PAGE);

    let sort = SortOrder::parse(query.sort.as_deref());
    let on_sale = if query.on_sale_only() { "1" } else { "" };
    let pager = Pager::new(
        &page,
        query_prefix(&[
            ("q", query.search()),
            ("category", query.category()),
            ("on_sale", on_sale),
            ("sort", if sort == SortOrder::Newest { "" } else { sort.as_str() }),
        ]),
    );

    let mut category_options = vec![SelectOption::new("", "All categories", query.category())];
    category_options.extend(
        categories(&products)
            .into_iter()
            .map(|c| SelectOption::new(c.clone(), c, query.category())),
    );

    Ok(ProductsIndexTemplate {
        layout,
        search: query.search().to_string(),
        on_sale_only: query.on_sale_only(),
        categories: category_options,
        sort_options: SortOrder::ALL
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), sort.as_str()))
            .collect(),
        products: page.items,
        pager,
    }
    .into_response())
}

/// Display a product.
#[instrument(skip(state, layout, auth))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let (product, settings) =
        tokio::join!(state.api().get_product(id), state.api().settings_or_default());
    let product = product.map_err(|e| match e {
        ApiError::NotFound => AppError::NotFound(format!("product {id}")),
        other => AppError::Api(other),
    })?;

    let is_favorite = match &auth {
        Some(auth) => match state.api().list_favorites(&auth.backend).await {
            Ok(favorites) => favorites.iter().any(|f| f.id == product.id),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load favorites");
                false
            }
        },
        None => false,
    };

    Ok(ProductShowTemplate {
        layout,
        description: product.description.clone(),
        product: ProductCard::new(&product, &settings, state.api()),
        is_favorite,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        serde_json::from_str(
            r#"[
                {"id":1,"name":"Blue Mug","description":"Ceramic","category":"Mugs","basePrice":10,"onSale":true,"discountPercentage":50,"createdAt":"2025-01-01T00:00:00Z"},
                {"id":2,"name":"Logo Tee","description":"Cotton","category":"Shirts","basePrice":15,"createdAt":"2025-03-01T00:00:00Z"},
                {"id":3,"name":"Red Mug","description":"Ceramic","category":"mugs","basePrice":8,"createdAt":"2025-02-01T00:00:00Z"}
            ]"#,
        )
        .unwrap()
    }

    fn names(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_default_sort_is_newest() {
        let products = catalog();
        let result = filter_catalog(&products, &CatalogQuery::default(), &Settings::default());
        assert_eq!(names(&result), vec!["Logo Tee", "Red Mug", "Blue Mug"]);
    }

    #[test]
    fn test_search_and_category_are_case_insensitive() {
        let products = catalog();
        let query = CatalogQuery {
            q: Some("CERAMIC".to_string()),
            category: Some("MUGS".to_string()),
            ..CatalogQuery::default()
        };
        let result = filter_catalog(&products, &query, &Settings::default());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_price_sort_uses_discounted_price() {
        let products = catalog();
        let query = CatalogQuery {
            sort: Some("price_asc".to_string()),
            ..CatalogQuery::default()
        };
        let result = filter_catalog(&products, &query, &Settings::default());
        // Blue Mug: 10 with 50% off = 5
        assert_eq!(names(&result), vec!["Blue Mug", "Red Mug", "Logo Tee"]);
    }

    #[test]
    fn test_on_sale_filter() {
        let products = catalog();
        let query = CatalogQuery {
            on_sale: Some("1".to_string()),
            ..CatalogQuery::default()
        };
        let result = filter_catalog(&products, &query, &Settings::default());
        assert_eq!(names(&result), vec!["Blue Mug"]);
    }

    #[test]
    fn test_categories_are_distinct_and_sorted() {
        assert_eq!(categories(&catalog()), vec!["Mugs", "Shirts"]);
    }

    #[test]
    fn test_pages_of_twelve() {
        let items: Vec<u32> = (0..30).collect();
        let last = Page::paginate(items, 3, PRODUCTS_PER_PAGE);
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.items.len(), 6);
    }
}
