//! Product management route handlers.

use std::collections::BTreeMap;

use askama::Template;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use printloom_api::{ApiError, ImageUpload, Product, ProductInput};
use printloom_core::{Discount, Page, ProductId, matches_search};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::Result,
    filters,
    flash::{Flash, outcome, set_flash, take_flash},
    middleware::RequireAdminAuth,
    models::AdminSession,
    state::AppState,
    views::{AdminUserView, Pager, ProductRow, SelectOption, query_prefix},
};

use super::{ListQuery, PER_PAGE, render};

/// Body limit for the product form, which may carry an image.
const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

// =============================================================================
// Templates
// =============================================================================

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub products: Vec<ProductRow>,
    pub search: String,
    pub categories: Vec<SelectOption>,
    pub pager: Pager,
}

/// Values shown in the product form.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub name: String,
    pub description: String,
    pub base_price: String,
    pub category: String,
    pub image_url: String,
    pub image_preview: Option<String>,
    pub on_sale: bool,
    pub discount_percentage: String,
    pub customizable: bool,
}

impl ProductFormView {
    fn from_product(product: &Product, preview: Option<String>) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            base_price: product.base_price.to_string(),
            category: product.category.clone().unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
            image_preview: preview,
            on_sale: product.on_sale,
            discount_percentage: product
                .discount_percentage
                .map(|d| d.normalize().to_string())
                .unwrap_or_default(),
            customizable: product.customizable,
        }
    }
}

/// Create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub title: String,
    pub action: String,
    /// Set when editing.
    pub product_id: Option<i64>,
    pub form: ProductFormView,
}

// =============================================================================
// Form parsing
// =============================================================================

/// Raw product form fields.
#[derive(Debug, Default)]
struct ProductForm {
    name: String,
    description: String,
    base_price: String,
    category: String,
    current_image_url: String,
    on_sale: bool,
    discount_percentage: String,
    customizable: bool,
    image: Option<ImageUpload>,
}

impl ProductForm {
    /// Check the fields and build the backend payload. The image URL is the
    /// current one; a new upload replaces it afterwards.
    fn validate(&self) -> std::result::Result<ProductInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required.".to_string());
        }

        let base_price: Decimal = self
            .base_price
            .trim()
            .parse()
            .map_err(|_| "Base price must be a number.".to_string())?;
        if base_price.is_sign_negative() {
            return Err("Base price cannot be negative.".to_string());
        }

        let discount_percentage = match self.discount_percentage.trim() {
            "" => None,
            raw => {
                let percent: Decimal = raw
                    .parse()
                    .map_err(|_| "Discount must be a number.".to_string())?;
                Discount::new(percent).map_err(|e| e.to_string())?;
                Some(percent)
            }
        };
        if self.on_sale && discount_percentage.is_none() {
            return Err("Products on sale need a discount percentage.".to_string());
        }

        Ok(ProductInput {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            base_price,
            category: non_empty(&self.category),
            image_url: non_empty(&self.current_image_url),
            on_sale: self.on_sale,
            discount_percentage,
            customizable: self.customizable,
        })
    }

    /// Echo the submitted values back into the form.
    fn view(&self) -> ProductFormView {
        ProductFormView {
            name: self.name.clone(),
            description: self.description.clone(),
            base_price: self.base_price.clone(),
            category: self.category.clone(),
            image_url: self.current_image_url.clone(),
            image_preview: None,
            on_sale: self.on_sale,
            discount_percentage: self.discount_percentage.clone(),
            customizable: self.customizable,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Read the multipart product form.
async fn read_product_form(mut multipart: Multipart) -> std::result::Result<ProductForm, String> {
    let mut form = ProductForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Could not read the form: {e}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().map(String::from);
            let content_type = field.content_type().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|_| "The image could not be read.".to_string())?;
            form.image = ImageUpload::from_form_field(
                file_name.as_deref(),
                content_type.as_deref(),
                bytes.to_vec(),
            )?;
            continue;
        }

        let text = field.text().await.map_err(|e| e.to_string())?;
        match name.as_str() {
            "name" => form.name = text,
            "description" => form.description = text,
            "base_price" => form.base_price = text,
            "category" => form.category = text,
            "current_image_url" => form.current_image_url = text,
            "on_sale" => form.on_sale = true,
            "discount_percentage" => form.discount_percentage = text,
            "customizable" => form.customizable = true,
            _ => {}
        }
    }
    Ok(form)
}

/// Validate the form and upload its image, if any.
async fn prepare_input(
    state: &AppState,
    current: &AdminSession,
    form: &mut ProductForm,
) -> std::result::Result<ProductInput, String> {
    let mut input = form.validate()?;
    if let Some(image) = form.image.take() {
        let upload = state
            .api()
            .upload_image(&current.backend, image)
            .await
            .map_err(|e| format!("Image upload failed: {}", e.user_message()))?;
        form.current_image_url.clone_from(&upload.url);
        input.image_url = Some(upload.url);
    }
    Ok(input)
}

// =============================================================================
// Router
// =============================================================================

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(index)
                .post(create)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/products/new", get(new_form))
        .route("/products/{id}/edit", get(edit_form))
        .route(
            "/products/{id}",
            post(update).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/products/{id}/delete", post(delete))
}

// =============================================================================
// Handlers
// =============================================================================

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

/// Products on the admin list: search over name, description and category,
/// then an exact (case-insensitive) category match.
fn filter_products<'a>(products: &'a [Product], search: &str, category: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| {
            matches_search(
                [
                    p.name.as_str(),
                    p.description.as_str(),
                    p.category.as_deref().unwrap_or_default(),
                ],
                search,
            )
        })
        .filter(|p| {
            category.is_empty()
                || p.category
                    .as_deref()
                    .is_some_and(|c| c.trim().eq_ignore_ascii_case(category))
        })
        .collect()
}

/// Products list page handler.
///
/// GET /products
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let (products, settings) = tokio::join!(
        state.api().list_products(),
        state.api().settings_or_default()
    );
    let products = products?;

    let search = query.search().to_string();
    let category = query.category.as_deref().map_or("", str::trim).to_string();

    let mut matches = filter_products(&products, &search, &category);
    matches.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let page = Page::paginate(matches, query.page(), PER_PAGE);
    let pager = Pager::new(
        &page,
        query_prefix(&[("q", &search), ("category", &category)]),
    );

    let categories = std::iter::once(SelectOption::new("", "All categories", &category))
        .chain(
            categories(&products)
                .into_iter()
                .map(|c| SelectOption::new(c.clone(), c, &category)),
        )
        .collect();

    Ok(render(&ProductsIndexTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/products".to_string(),
        flash: take_flash(&session).await,
        products: page
            .items
            .iter()
            .map(|p| ProductRow::new(p, &settings, state.api()))
            .collect(),
        search,
        categories,
        pager,
    }))
}

/// New product form.
///
/// GET /products/new
#[instrument(skip_all)]
async fn new_form(session: Session, RequireAdminAuth(current): RequireAdminAuth) -> Response {
    render(&ProductFormTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/products".to_string(),
        flash: take_flash(&session).await,
        title: "New product".to_string(),
        action: "/products".to_string(),
        product_id: None,
        form: ProductFormView::default(),
    })
}

/// Create a product.
///
/// POST /products
#[instrument(skip_all)]
async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    multipart: Multipart,
) -> Response {
    let rerender = |form: ProductFormView, message: String| {
        render(&ProductFormTemplate {
            admin_user: AdminUserView::from(&current.admin),
            current_path: "/products".to_string(),
            flash: Some(Flash::error(message)),
            title: "New product".to_string(),
            action: "/products".to_string(),
            product_id: None,
            form,
        })
    };

    let mut form = match read_product_form(multipart).await {
        Ok(form) => form,
        Err(message) => return rerender(ProductFormView::default(), message),
    };
    let input = match prepare_input(&state, &current, &mut form).await {
        Ok(input) => input,
        Err(message) => return rerender(form.view(), message),
    };

    match state.api().create_product(&current.backend, &input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            set_flash(
                &session,
                Flash::success(format!("Product \"{}\" created.", product.name)),
            )
            .await;
            Redirect::to("/products").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create product");
            rerender(form.view(), e.user_message())
        }
    }
}

/// Edit product form.
///
/// GET /products/{id}/edit
#[instrument(skip_all)]
async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = state.api().get_product(id).await?;
    let preview = product.image_url.as_deref().map(|u| state.api().asset_url(u));

    Ok(render(&ProductFormTemplate {
        admin_user: AdminUserView::from(&current.admin),
        current_path: "/products".to_string(),
        flash: take_flash(&session).await,
        title: format!("Edit {}", product.name),
        action: format!("/products/{id}"),
        product_id: Some(id.as_i64()),
        form: ProductFormView::from_product(&product, preview),
    }))
}

/// Update a product.
///
/// POST /products/{id}
#[instrument(skip_all)]
async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Response {
    let rerender = |form: ProductFormView, message: String| {
        render(&ProductFormTemplate {
            admin_user: AdminUserView::from(&current.admin),
            current_path: "/products".to_string(),
            flash: Some(Flash::error(message)),
            title: "Edit product".to_string(),
            action: format!("/products/{id}"),
            product_id: Some(id.as_i64()),
            form,
        })
    };

    let mut form = match read_product_form(multipart).await {
        Ok(form) => form,
        Err(message) => return rerender(ProductFormView::default(), message),
    };
    let input = match prepare_input(&state, &current, &mut form).await {
        Ok(input) => input,
        Err(message) => return rerender(form.view(), message),
    };

    match state.api().update_product(&current.backend, id, &input).await {
        Ok(product) => {
            tracing::info!(product_id = %id, "Product updated");
            set_flash(
                &session,
                Flash::success(format!("Product \"{}\" saved.", product.name)),
            )
            .await;
            Redirect::to("/products").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to update product");
            rerender(form.view(), e.user_message())
        }
    }
}

/// Delete a product.
///
/// POST /products/{id}/delete
#[instrument(skip_all)]
async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(current): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Redirect {
    let result = state.api().delete_product(&current.backend, id).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, product_id = %id, "Failed to delete product");
    }
    set_flash(
        &session,
        outcome(&result, "Product deleted.", ApiError::user_message),
    )
    .await;
    Redirect::to("/products")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: " Mug ".to_string(),
            base_price: "10".to_string(),
            category: "Drinkware".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_validate_builds_input() {
        let input = form().validate().unwrap();
        assert_eq!(input.name, "Mug");
        assert_eq!(input.base_price, Decimal::from(10));
        assert_eq!(input.category.as_deref(), Some("Drinkware"));
        assert!(input.image_url.is_none());
        assert!(input.discount_percentage.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_prices() {
        let mut bad = form();
        bad.base_price = "ten".to_string();
        assert_eq!(bad.validate().unwrap_err(), "Base price must be a number.");

        bad.base_price = "-1".to_string();
        assert_eq!(bad.validate().unwrap_err(), "Base price cannot be negative.");
    }

    #[test]
    fn test_validate_sale_needs_discount() {
        let mut sale = form();
        sale.on_sale = true;
        assert!(sale.validate().is_err());

        sale.discount_percentage = "10".to_string();
        let input = sale.validate().unwrap();
        assert_eq!(input.discount_percentage, Some(Decimal::from(10)));

        sale.discount_percentage = "150".to_string();
        assert!(sale.validate().is_err());
    }

    #[test]
    fn test_filter_products_by_search_and_category() {
        let products: Vec<Product> = serde_json::from_str(
            r#"[{"id":1,"name":"Blue Mug","basePrice":10,"category":"Drinkware"},
                {"id":2,"name":"Tee","basePrice":15,"category":"Apparel"},
                {"id":3,"name":"Mug Coaster","basePrice":4,"category":"drinkware "}]"#,
        )
        .unwrap();
        assert_eq!(filter_products(&products, "mug", "").len(), 2);
        assert_eq!(filter_products(&products, "", "DRINKWARE").len(), 2);
        assert_eq!(filter_products(&products, "tee", "Drinkware").len(), 0);
        assert_eq!(categories(&products), vec!["Apparel", "Drinkware"]);
    }
}
