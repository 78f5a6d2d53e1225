//! Admin console flows against the fake backend.

#![allow(clippy::unwrap_used)]

use printloom_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, CUSTOMER_EMAIL, CUSTOMER_PASSWORD, FakeBackend, browser,
    browser_no_redirects, start_admin,
};
use reqwest::{Client, StatusCode, header};

async fn sign_in(client: &Client, base: &str, email: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{base}/auth/login"))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_admin_login_lands_on_dashboard() {
    let backend = FakeBackend::start().await;
    let base = start_admin(&backend).await;
    let client = browser();

    let resp = sign_in(&client, &base, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Welcome back, Printloom."));
    // Paid orders only: #103 at €15.80 and #104 at €35.00
    assert!(body.contains("€50.80"));
}

#[tokio::test]
async fn test_customer_account_is_refused() {
    let backend = FakeBackend::start().await;
    let base = start_admin(&backend).await;
    let client = browser();

    let resp = sign_in(&client, &base, CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;
    assert_eq!(resp.url().path(), "/auth/login");
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("This account does not have admin access.")
    );
    assert_eq!(backend.logouts(), 1);
    assert_eq!(backend.active_sessions(), 0);

    let orders = browser_no_redirects()
        .get(format!("{base}/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(orders.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        orders.headers().get(header::LOCATION).unwrap(),
        "/auth/login"
    );
}

#[tokio::test]
async fn test_order_filters() {
    let backend = FakeBackend::start().await;
    let base = start_admin(&backend).await;
    let client = browser();
    sign_in(&client, &base, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let all = client
        .get(format!("{base}/orders"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    for id in ["#101", "#102", "#103"] {
        assert!(all.contains(id), "missing {id}");
    }

    let cancelled = client
        .get(format!("{base}/orders?status=CANCELLED"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(cancelled.contains("#102"));
    assert!(!cancelled.contains("#101"));
    assert!(!cancelled.contains("#103"));

    let by_client = client
        .get(format!("{base}/orders?q=grace"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(by_client.contains("#103"));
    assert!(!by_client.contains("#102"));

    let none = client
        .get(format!("{base}/orders?status=CANCELLED&q=grace"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(none.contains("No orders match these filters."));
}

#[tokio::test]
async fn test_logout_ends_both_sessions() {
    let backend = FakeBackend::start().await;
    let base = start_admin(&backend).await;
    let client = browser();
    sign_in(&client, &base, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(backend.active_sessions(), 1);

    let resp = client
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/auth/login");
    assert_eq!(backend.active_sessions(), 0);

    let after = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(after.url().path(), "/auth/login");
}
