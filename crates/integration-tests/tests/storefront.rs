//! Storefront flows against the fake backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use printloom_integration_tests::{
    BROKEN_PRODUCT_ID, CUSTOMER_EMAIL, CUSTOMER_ID, CUSTOMER_PASSWORD, FakeBackend, MUG_ID,
    PENDING_ORDER_ID, SHIPPED_ORDER_ID, STICKER_ID, browser, browser_no_redirects,
    start_storefront,
};
use reqwest::{Client, StatusCode, header, multipart};

async fn sign_in(client: &Client, base: &str) -> reqwest::Response {
    client
        .post(format!("{base}/auth/login"))
        .form(&[("email", CUSTOMER_EMAIL), ("password", CUSTOMER_PASSWORD)])
        .send()
        .await
        .unwrap()
}

async fn add_to_cart(client: &Client, base: &str, product_id: i64, quantity: u32) {
    let form = multipart::Form::new()
        .text("product_id", product_id.to_string())
        .text("quantity", quantity.to_string());
    let resp = client
        .post(format!("{base}/cart/add"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn page(client: &Client, url: &str) -> String {
    client.get(url).send().await.unwrap().text().await.unwrap()
}

const SHIPPING_FORM: [(&str, &str); 5] = [
    ("full_name", "Ada Lovelace"),
    ("street", "1 Loom Lane"),
    ("city", "London"),
    ("postal_code", "N1 9GU"),
    ("country", "GB"),
];

#[tokio::test]
async fn test_catalog_shows_discounted_tax_inclusive_price() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;

    let resp = browser()
        .get(format!("{base}/products/{MUG_ID}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Classic Mug"));
    // 10.00 + 20% tax, then 10% off
    assert!(body.contains("€10.80"));
}

#[tokio::test]
async fn test_login_then_add_to_cart() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();

    let resp = sign_in(&client, &base).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/");
    assert!(resp.text().await.unwrap().contains("Welcome back, Ada!"));
    assert_eq!(backend.logins(), 1);

    let form = multipart::Form::new()
        .text("product_id", MUG_ID.to_string())
        .text("quantity", "3")
        .text("customization_text", "For Ada");
    let resp = client
        .post(format!("{base}/cart/add"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), format!("/products/{MUG_ID}"));
    assert!(resp.text().await.unwrap().contains("Classic Mug added to your cart."));

    let body = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("€10.80"));
    assert!(body.contains("€32.40"));
    // Subtotal plus flat shipping
    assert!(body.contains("€37.40"));
    assert!(body.contains("For Ada"));
}

#[tokio::test]
async fn test_wrong_password_stays_on_login() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;

    let resp = browser()
        .post(format!("{base}/auth/login"))
        .form(&[("email", CUSTOMER_EMAIL), ("password", "nope")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/auth/login");
    assert!(resp.text().await.unwrap().contains("Invalid email or password."));
    assert_eq!(backend.active_sessions(), 0);
}

#[tokio::test]
async fn test_account_requires_login() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;

    let resp = browser_no_redirects()
        .get(format!("{base}/account/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/auth/login?next=%2Faccount%2Forders"
    );
}

#[tokio::test]
async fn test_backend_errors_map_to_pages() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();

    let missing = client
        .get(format!("{base}/products/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let broken = client
        .get(format!("{base}/products/{BROKEN_PRODUCT_ID}"))
        .send()
        .await
        .unwrap();
    assert_eq!(broken.status(), StatusCode::BAD_GATEWAY);
    let body = broken.text().await.unwrap();
    assert!(!body.contains("relation"));
}

#[tokio::test]
async fn test_request_id_reaches_backend() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;

    let resp = browser()
        .get(format!("{base}/products/{MUG_ID}"))
        .header("x-request-id", "it-7f3a")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "it-7f3a");
    assert_eq!(backend.product_request_ids(), vec!["it-7f3a".to_string()]);
}

#[tokio::test]
async fn test_health_endpoints() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();

    let live = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);

    let ready = client
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_charges_the_total_shown_in_the_cart() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();
    sign_in(&client, &base).await;

    // 1.99 + 20% tax is 2.388 a unit: shown and charged as €2.39
    add_to_cart(&client, &base, STICKER_ID, 3).await;
    let cart = page(&client, &format!("{base}/cart")).await;
    assert!(cart.contains("€2.39"));
    assert!(cart.contains("€7.17"));
    assert!(cart.contains("€12.17"));

    let resp = client
        .post(format!("{base}/checkout"))
        .form(&SHIPPING_FORM)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Amount due: <strong>€12.17</strong>"));
    assert!(body.contains("pi_1_secret_test"));

    let intents = backend.payment_intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0]["amount"], 1217);
    assert_eq!(intents[0]["currency"], "eur");

    let order_id = intents[0]["orderId"].as_i64().unwrap();
    let order = page(&client, &format!("{base}/account/orders/{order_id}")).await;
    assert!(order.contains("€12.17"));
}

#[tokio::test]
async fn test_cart_is_cleared_only_after_a_successful_payment() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();
    sign_in(&client, &base).await;
    add_to_cart(&client, &base, MUG_ID, 1).await;

    client
        .post(format!("{base}/checkout"))
        .form(&SHIPPING_FORM)
        .send()
        .await
        .unwrap();
    let order_id = backend.payment_intents()[0]["orderId"].as_i64().unwrap();

    let failed = page(
        &client,
        &format!("{base}/checkout/complete?order_id={order_id}&redirect_status=failed"),
    )
    .await;
    assert!(failed.contains("Payment not completed"));
    assert_eq!(backend.cart_lines(CUSTOMER_ID), 1);

    let processing = page(
        &client,
        &format!("{base}/checkout/complete?order_id={order_id}&redirect_status=processing"),
    )
    .await;
    assert!(processing.contains("Payment processing"));
    assert_eq!(backend.cart_lines(CUSTOMER_ID), 1);

    let succeeded = page(
        &client,
        &format!("{base}/checkout/complete?order_id={order_id}&redirect_status=succeeded"),
    )
    .await;
    assert!(succeeded.contains("Thank you!"));
    assert_eq!(backend.cart_lines(CUSTOMER_ID), 0);
}

#[tokio::test]
async fn test_change_requests_only_for_open_orders() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();
    sign_in(&client, &base).await;

    let form = [("kind", "MODIFY"), ("message", "Please print it in blue.")];
    let shipped = client
        .post(format!("{base}/account/orders/{SHIPPED_ORDER_ID}/change-request"))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(
        shipped.url().path(),
        format!("/account/orders/{SHIPPED_ORDER_ID}")
    );
    assert!(
        shipped
            .text()
            .await
            .unwrap()
            .contains("This order can no longer be changed.")
    );
    assert_eq!(backend.change_requests(), 0);

    let pending = client
        .post(format!("{base}/account/orders/{PENDING_ORDER_ID}/change-request"))
        .form(&form)
        .send()
        .await
        .unwrap();
    let body = pending.text().await.unwrap();
    assert!(body.contains("Your request has been sent."));
    assert!(body.contains("Please print it in blue."));
    assert_eq!(backend.change_requests(), 1);
}

#[tokio::test]
async fn test_favorites_add_and_remove() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser();
    sign_in(&client, &base).await;

    let added = client
        .post(format!("{base}/favorites/{MUG_ID}"))
        .send()
        .await
        .unwrap();
    assert_eq!(added.url().path(), "/favorites");
    let body = added.text().await.unwrap();
    assert!(body.contains("Added to your favorites."));
    assert!(body.contains("Classic Mug"));

    let removed = client
        .post(format!("{base}/favorites/{MUG_ID}/remove"))
        .send()
        .await
        .unwrap();
    let body = removed.text().await.unwrap();
    assert!(body.contains("Removed from your favorites."));
    assert!(body.contains("Browse the catalog"));
}

#[tokio::test]
async fn test_only_credential_posts_are_rate_limited() {
    let backend = FakeBackend::start().await;
    let base = start_storefront(&backend).await;
    let client = browser_no_redirects();

    for _ in 0..8 {
        let resp = client
            .get(format!("{base}/auth/login"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let mut statuses = Vec::new();
    for _ in 0..7 {
        let resp = client
            .post(format!("{base}/auth/login"))
            .form(&[("email", CUSTOMER_EMAIL), ("password", "nope")])
            .send()
            .await
            .unwrap();
        statuses.push(resp.status());
    }
    assert!(statuses[..5].iter().all(|s| *s == StatusCode::SEE_OTHER));
    assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));

    let resp = client
        .get(format!("{base}/auth/login"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
