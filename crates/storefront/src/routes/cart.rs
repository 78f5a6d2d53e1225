//! Cart route handlers.
//!
//! The cart lives in the backend, keyed by the signed-in user. Every
//! mutation redirects back to a page that refetches it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use printloom_api::{
    ApiClient, ApiError, BackendSession, Cart, Customization, ImageUpload, NewCartItem, Settings,
};
use printloom_core::{CartItemId, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::layout::Layout;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

/// Most units of one line a shopper can order.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Longest customization text accepted.
pub const MAX_CUSTOMIZATION_CHARS: usize = 200;

// =============================================================================
// View Models
// =============================================================================

/// One cart line for display.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub customization_text: Option<String>,
    pub customization_image: Option<String>,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
}

impl CartView {
    /// Flatten the backend cart and price it with the current settings.
    #[must_use]
    pub fn build(cart: &Cart, settings: &Settings, api: &ApiClient) -> Self {
        let totals = cart.totals(settings);
        Self {
            lines: cart
                .items
                .iter()
                .map(|item| {
                    let line = item.line(settings);
                    let customization = item.customization.as_ref();
                    CartLineView {
                        id: item.id.as_i64(),
                        product_id: item.product.id.as_i64(),
                        name: item.product.name.clone(),
                        image_url: item.product.image_url.as_deref().map(|u| api.asset_url(u)),
                        customization_text: customization.and_then(|c| c.text.clone()),
                        customization_image: customization
                            .and_then(|c| c.image_url.as_deref())
                            .map(|u| api.asset_url(u)),
                        unit_price: line.unit.display(),
                        quantity: item.quantity,
                        line_total: line.total().display(),
                    }
                })
                .collect(),
            item_count: totals.item_count,
            subtotal: totals.subtotal.display(),
            shipping: totals.shipping.display(),
            total: totals.total.display(),
        }
    }

    /// Whether there is nothing to check out.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Fetch the cart, degrading to an empty one when the backend fails.
///
/// An expired backend session is still an error so the shopper is sent to
/// log in again.
pub(crate) async fn load_cart(api: &ApiClient, session: &BackendSession) -> Result<Cart> {
    match api.get_cart(session).await {
        Ok(cart) => Ok(cart),
        Err(ApiError::Unauthorized) => Err(AppError::Api(ApiError::Unauthorized)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart, showing it empty");
            Ok(Cart::default())
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Fields of the add-to-cart form.
#[derive(Debug, Default)]
struct AddToCartForm {
    product_id: Option<ProductId>,
    quantity: Option<u32>,
    text: Option<String>,
    image: Option<ImageUpload>,
}

/// Read the multipart add-to-cart form.
async fn read_add_form(mut multipart: Multipart) -> std::result::Result<AddToCartForm, String> {
    let mut form = AddToCartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Could not read the form: {e}"))?
    {
        match field.name().unwrap_or_default() {
            "product_id" => {
                let text = field.text().await.map_err(|e| e.to_string())?;
                form.product_id = text.trim().parse().ok();
            }
            "quantity" => {
                let text = field.text().await.map_err(|e| e.to_string())?;
                form.quantity = text.trim().parse().ok();
            }
            "customization_text" => {
                let text = field.text().await.map_err(|e| e.to_string())?;
                if text.chars().count() > MAX_CUSTOMIZATION_CHARS {
                    return Err(format!(
                        "Customization text is limited to {MAX_CUSTOMIZATION_CHARS} characters."
                    ));
                }
                form.text = Some(text);
            }
            "customization_image" => {
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
            }
            _ => {}
        }
    }
    Ok(form)
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, layout, auth))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Response> {
    let cart = match &auth {
        Some(auth) => {
            let (cart, settings) = tokio::join!(
                load_cart(state.api(), &auth.backend),
                state.api().settings_or_default()
            );
            CartView::build(&cart?, &settings, state.api())
        }
        None => CartView::build(
            &Cart::default(),
            &state.api().settings_or_default().await,
            state.api(),
        ),
    };

    Ok(CartShowTemplate { layout, cart }.into_response())
}

/// Add an item to the cart.
///
/// Customization text and image are only kept for customizable products.
/// An attached image is uploaded first and its URL stored on the line.
#[instrument(skip(state, session, auth, multipart))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    multipart: Multipart,
) -> Response {
    let form = match read_add_form(multipart).await {
        Ok(form) => form,
        Err(message) => {
            set_flash(&session, Flash::error(message)).await;
            return Redirect::to("/products").into_response();
        }
    };

    let Some(product_id) = form.product_id else {
        set_flash(&session, Flash::error("Please choose a product.")).await;
        return Redirect::to("/products").into_response();
    };
    let back = format!("/products/{product_id}");

    let product = match state.api().get_product(product_id).await {
        Ok(product) => product,
        Err(e) => {
            set_flash(&session, Flash::error(e.user_message())).await;
            return Redirect::to("/products").into_response();
        }
    };

    let customization = if product.customizable {
        let image_url = match form.image {
            Some(image) => match state.api().upload_image(&auth.backend, image).await {
                Ok(upload) => Some(upload.url),
                Err(e) => {
                    tracing::warn!(error = %e, "Customization image upload failed");
                    set_flash(&session, Flash::error(e.user_message())).await;
                    return Redirect::to(&back).into_response();
                }
            },
            None => None,
        };
        Customization::non_empty(form.text, image_url)
    } else {
        None
    };

    let item = NewCartItem {
        product_id,
        quantity: form.quantity.unwrap_or(1).clamp(1, MAX_LINE_QUANTITY),
        customization,
    };

    match state.api().add_to_cart(&auth.backend, &item).await {
        Ok(()) => {
            let id = product_id.to_string();
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
            set_flash(&session, Flash::success(format!("{} added to your cart.", product.name)))
                .await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Add to cart failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(&back).into_response()
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(state, session, auth))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let result = if form.quantity == 0 {
        state.api().remove_cart_item(&auth.backend, form.item_id).await
    } else {
        state
            .api()
            .update_cart_item(
                &auth.backend,
                form.item_id,
                form.quantity.min(MAX_LINE_QUANTITY),
            )
            .await
    };

    match result {
        Ok(()) => set_flash(&session, Flash::success("Cart updated.")).await,
        Err(e) => {
            tracing::warn!(error = %e, "Cart update failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/cart").into_response()
}

/// Remove a line.
#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    match state.api().remove_cart_item(&auth.backend, form.item_id).await {
        Ok(()) => set_flash(&session, Flash::success("Item removed from your cart.")).await,
        Err(e) => {
            tracing::warn!(error = %e, "Cart removal failed");
            set_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to("/cart").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn test_cart_view_prices_lines_with_tax_and_discount() {
        let api = ApiClient::new(&printloom_api::ApiConfig::new(
            Url::parse("http://localhost:4000").unwrap(),
        ))
        .unwrap();
        let cart: Cart = serde_json::from_str(
            r#"{"items":[
                {"id":7,"product":{"id":1,"name":"Mug","basePrice":10,"onSale":true,"discountPercentage":10},"quantity":2,"customization":{"text":"Hi"}},
                {"id":8,"product":{"id":2,"name":"Tee","basePrice":5},"quantity":1}
            ]}"#,
        )
        .unwrap();
        let settings = Settings {
            tax_rate: "0.2".parse().unwrap(),
            shipping_cost: "4.99".parse().unwrap(),
            ..Settings::default()
        };

        let view = CartView::build(&cart, &settings, &api);
        assert_eq!(view.lines[0].unit_price, "€10.80");
        assert_eq!(view.lines[0].line_total, "€21.60");
        assert_eq!(view.lines[0].customization_text.as_deref(), Some("Hi"));
        assert_eq!(view.lines[1].line_total, "€6.00");
        assert_eq!(view.subtotal, "€27.60");
        assert_eq!(view.shipping, "€4.99");
        assert_eq!(view.total, "€32.59");
        assert_eq!(view.item_count, 3);
    }

    #[test]
    fn test_empty_cart_owes_no_shipping() {
        let api = ApiClient::new(&printloom_api::ApiConfig::new(
            Url::parse("http://localhost:4000").unwrap(),
        ))
        .unwrap();
        let settings = Settings {
            shipping_cost: "4.99".parse().unwrap(),
            ..Settings::default()
        };
        let view = CartView::build(&Cart::default(), &settings, &api);
        assert!(view.is_empty());
        assert_eq!(view.total, "€0.00");
    }
}
