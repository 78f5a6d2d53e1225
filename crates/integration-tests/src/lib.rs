//! End-to-end tests for Printloom.
//!
//! The storefront and admin routers run in-process on ephemeral ports and
//! talk to [`FakeBackend`], a small axum app that serves the REST API from
//! fixtures kept in memory. Tests drive them with a cookie-keeping
//! [`reqwest::Client`], the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p printloom-integration-tests
//! ```
//!
//! Nothing external is needed: every server binds to `127.0.0.1:0`.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

// =============================================================================
// Fixtures
// =============================================================================

/// A shopper account.
pub const CUSTOMER_EMAIL: &str = "ada@example.com";
/// Password for [`CUSTOMER_EMAIL`].
pub const CUSTOMER_PASSWORD: &str = "analytical-engine";
/// Backend user id of [`CUSTOMER_EMAIL`].
pub const CUSTOMER_ID: i64 = 1;
/// A back-office account.
pub const ADMIN_EMAIL: &str = "admin@printloom.test";
/// Password for [`ADMIN_EMAIL`].
pub const ADMIN_PASSWORD: &str = "back-office-2026";

/// Customizable mug: base 10.00, 10% off.
pub const MUG_ID: i64 = 1;
/// Plain poster, no discount.
pub const POSTER_ID: i64 = 2;
/// Sticker at 1.99; with 20% tax a unit is 2.388, shown as €2.39.
pub const STICKER_ID: i64 = 3;
/// Ada's pending, unpaid order.
pub const PENDING_ORDER_ID: i64 = 101;
/// Ada's order that has already shipped.
pub const SHIPPED_ORDER_ID: i64 = 104;
/// A product id the backend fails on with a 500.
pub const BROKEN_PRODUCT_ID: i64 = 13;

const SESSION_COOKIE: &str = "sid";

fn users() -> Vec<Value> {
    vec![
        json!({
            "id": 1, "name": "Ada Lovelace", "email": CUSTOMER_EMAIL, "role": "user",
            "phone": "+44 20 7946 0000", "createdAt": "2026-01-10T09:00:00Z"
        }),
        json!({
            "id": 2, "name": "Printloom Admin", "email": ADMIN_EMAIL, "role": "admin",
            "createdAt": "2026-01-01T09:00:00Z"
        }),
        json!({
            "id": 3, "name": "Grace Hopper", "email": "grace@example.com", "role": "user",
            "createdAt": "2026-02-01T09:00:00Z"
        }),
    ]
}

fn password_for(email: &str) -> Option<&'static str> {
    match email {
        CUSTOMER_EMAIL => Some(CUSTOMER_PASSWORD),
        ADMIN_EMAIL => Some(ADMIN_PASSWORD),
        _ => None,
    }
}

fn products() -> Vec<Value> {
    vec![
        json!({
            "id": MUG_ID, "name": "Classic Mug", "description": "Ceramic, 330 ml.",
            "basePrice": 10, "category": "Mugs", "onSale": true,
            "discountPercentage": 10, "customizable": true,
            "createdAt": "2026-02-10T09:00:00Z"
        }),
        json!({
            "id": POSTER_ID, "name": "Gallery Poster", "description": "A2 matte print.",
            "basePrice": 25, "category": "Posters", "onSale": false,
            "customizable": false, "createdAt": "2026-02-12T09:00:00Z"
        }),
        json!({
            "id": STICKER_ID, "name": "Die-cut Sticker", "description": "Vinyl, 7 cm.",
            "basePrice": 1.99, "category": "Stickers", "onSale": false,
            "customizable": false, "createdAt": "2026-02-14T09:00:00Z"
        }),
    ]
}

fn orders() -> Vec<Value> {
    let ada = json!({"id": 1, "name": "Ada Lovelace", "email": CUSTOMER_EMAIL});
    let ada_again = ada.clone();
    let grace = json!({"id": 3, "name": "Grace Hopper", "email": "grace@example.com"});
    let address = |name: &str| {
        json!({
            "fullName": name, "street": "1 Loom Lane", "city": "London",
            "postalCode": "N1 9GU", "country": "GB"
        })
    };
    vec![
        json!({
            "id": PENDING_ORDER_ID, "userId": 1, "user": ada.clone(), "status": "PENDING", "paymentStatus": "PENDING",
            "items": [{"id": 1, "productId": MUG_ID, "productName": "Classic Mug",
                       "quantity": 2, "unitPrice": 10.8}],
            "shippingCost": 5, "totalAmount": 26.6,
            "shippingAddress": address("Ada Lovelace"), "createdAt": "2026-03-01T10:00:00Z"
        }),
        json!({
            "id": 102, "userId": 1, "user": ada, "status": "CANCELLED", "paymentStatus": "REFUNDED",
            "items": [{"id": 2, "productId": POSTER_ID, "productName": "Gallery Poster",
                       "quantity": 1, "unitPrice": 30}],
            "shippingCost": 5, "totalAmount": 35,
            "shippingAddress": address("Ada Lovelace"), "createdAt": "2026-03-02T10:00:00Z"
        }),
        json!({
            "id": 103, "userId": 3, "user": grace, "status": "SHIPPED", "paymentStatus": "SUCCEEDED",
            "items": [{"id": 3, "productId": MUG_ID, "productName": "Classic Mug",
                       "quantity": 1, "unitPrice": 10.8}],
            "shippingCost": 5, "totalAmount": 15.8,
            "shippingAddress": address("Grace Hopper"), "createdAt": "2026-03-03T10:00:00Z"
        }),
        json!({
            "id": SHIPPED_ORDER_ID, "userId": 1, "user": ada_again, "status": "SHIPPED",
            "paymentStatus": "SUCCEEDED",
            "items": [{"id": 4, "productId": POSTER_ID, "productName": "Gallery Poster",
                       "quantity": 1, "unitPrice": 30}],
            "shippingCost": 5, "totalAmount": 35,
            "shippingAddress": address("Ada Lovelace"), "createdAt": "2026-03-04T10:00:00Z"
        }),
    ]
}

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct BackendData {
    sessions: HashMap<String, i64>,
    issued: u64,
    carts: HashMap<i64, Vec<Value>>,
    next_cart_item: i64,
    orders: Vec<Value>,
    next_order: i64,
    favorites: HashMap<i64, Vec<i64>>,
    change_requests: Vec<Value>,
    payment_intents: Vec<Value>,
    logins: u32,
    logouts: u32,
    product_request_ids: Vec<String>,
}

#[derive(Clone)]
struct Backend {
    data: Arc<Mutex<BackendData>>,
}

impl Backend {
    fn with_fixtures() -> Self {
        let data = BackendData {
            orders: orders(),
            next_order: 500,
            ..BackendData::default()
        };
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackendData> {
        self.data.lock().expect("backend state poisoned")
    }

    /// The user id the request's cookie belongs to.
    fn user_id(&self, headers: &HeaderMap) -> Option<i64> {
        let token = session_token(headers)?;
        self.lock().sessions.get(&token).copied()
    }

    fn user(&self, headers: &HeaderMap) -> Option<Value> {
        let id = self.user_id(headers)?;
        users().into_iter().find(|u| u["id"] == id)
    }

    fn is_admin(&self, headers: &HeaderMap) -> bool {
        self.user(headers).is_some_and(|u| u["role"] == "admin")
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find_map(|(name, value)| (name == SESSION_COOKIE).then(|| value.to_string()))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Not authenticated"})),
    )
        .into_response()
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({"message": "Admins only"}))).into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": format!("{what} not found")})),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"message": message}))).into_response()
}

async fn login(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let Some(user) = users().into_iter().find(|u| u["email"] == email) else {
        return unauthorized();
    };
    if password_for(email) != Some(password) {
        return unauthorized();
    }

    let token = {
        let mut data = backend.lock();
        data.issued += 1;
        data.logins += 1;
        let token = format!("tok-{}", data.issued);
        let id = user["id"].as_i64().unwrap_or_default();
        data.sessions.insert(token.clone(), id);
        token
    };

    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"),
        )],
        Json(json!({ "user": user })),
    )
        .into_response()
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> StatusCode {
    let token = session_token(&headers);
    let mut data = backend.lock();
    data.logouts += 1;
    if let Some(token) = token {
        data.sessions.remove(&token);
    }
    StatusCode::NO_CONTENT
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .user(&headers)
        .map_or_else(unauthorized, |user| Json(user).into_response())
}

async fn settings() -> Json<Value> {
    Json(json!({"shippingCost": 5, "taxRate": 0.2, "currency": "EUR"}))
}

async fn list_products() -> Json<Vec<Value>> {
    Json(products())
}

async fn get_product(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Some(request_id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        backend
            .lock()
            .product_request_ids
            .push(request_id.to_string());
    }
    if id == BROKEN_PRODUCT_ID {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "relation \"products\" is locked"})),
        )
            .into_response();
    }
    products().into_iter().find(|p| p["id"] == id).map_or_else(
        || (StatusCode::NOT_FOUND, Json(json!({"message": "Product not found"}))).into_response(),
        |p| Json(p).into_response(),
    )
}

async fn get_cart(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let items = backend
        .lock()
        .carts
        .get(&user_id)
        .cloned()
        .unwrap_or_default();
    Json(json!({ "items": items })).into_response()
}

async fn add_to_cart(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let Some(product) = products()
        .into_iter()
        .find(|p| p["id"] == body["productId"])
    else {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "Unknown product"})))
            .into_response();
    };

    let mut data = backend.lock();
    data.next_cart_item += 1;
    let item = json!({
        "id": data.next_cart_item,
        "product": product,
        "quantity": body["quantity"],
        "customization": body.get("customization").cloned().unwrap_or(Value::Null),
    });
    data.carts.entry(user_id).or_default().push(item);
    StatusCode::CREATED.into_response()
}

async fn clear_cart(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    backend.lock().carts.remove(&user_id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_favorites(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let ids = backend
        .lock()
        .favorites
        .get(&user_id)
        .cloned()
        .unwrap_or_default();
    let favorites: Vec<Value> = products()
        .into_iter()
        .filter(|p| ids.iter().any(|id| p["id"] == *id))
        .collect();
    Json(favorites).into_response()
}

async fn add_favorite(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let Some(product_id) = body["productId"].as_i64() else {
        return bad_request("productId is required");
    };
    let mut data = backend.lock();
    let ids = data.favorites.entry(user_id).or_default();
    if !ids.contains(&product_id) {
        ids.push(product_id);
    }
    StatusCode::CREATED.into_response()
}

async fn remove_favorite(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    if let Some(ids) = backend.lock().favorites.get_mut(&user_id) {
        ids.retain(|id| *id != product_id);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_orders(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let admin = backend.is_admin(&headers);
    let visible: Vec<Value> = backend
        .lock()
        .orders
        .iter()
        .filter(|o| admin || o["userId"] == user_id)
        .cloned()
        .collect();
    Json(visible).into_response()
}

async fn get_order(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let admin = backend.is_admin(&headers);
    backend
        .lock()
        .orders
        .iter()
        .find(|o| o["id"] == id && (admin || o["userId"] == user_id))
        .cloned()
        .map_or_else(|| not_found("Order"), |o| Json(o).into_response())
}

/// Stores the order exactly as sent: unit prices and total come from the
/// client.
async fn create_order(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(user) = backend.user(&headers) else {
        return unauthorized();
    };
    let Some(lines) = body["items"].as_array().filter(|l| !l.is_empty()) else {
        return bad_request("An order needs at least one item");
    };

    let catalog = products();
    let mut data = backend.lock();
    data.next_order += 1;
    let id = data.next_order;
    let items: Vec<Value> = lines
        .iter()
        .zip(1..)
        .map(|(line, n)| {
            let name = catalog
                .iter()
                .find(|p| p["id"] == line["productId"])
                .map_or(Value::Null, |p| p["name"].clone());
            json!({
                "id": id * 100 + n,
                "productId": line["productId"],
                "productName": name,
                "quantity": line["quantity"],
                "unitPrice": line["unitPrice"],
                "customization": line.get("customization").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();
    let order = json!({
        "id": id,
        "userId": user["id"],
        "user": {"id": user["id"], "name": user["name"], "email": user["email"]},
        "status": "PENDING",
        "paymentStatus": "PENDING",
        "items": items,
        "shippingCost": body["shippingCost"],
        "totalAmount": body["totalAmount"],
        "shippingAddress": body["shippingAddress"],
        "createdAt": "2026-03-10T10:00:00Z",
    });
    data.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn create_payment_intent(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if backend.user_id(&headers).is_none() {
        return unauthorized();
    }
    if body["amount"].as_i64().is_none_or(|amount| amount <= 0) {
        return bad_request("Amount must be a positive number of cents");
    }
    let mut data = backend.lock();
    data.payment_intents.push(body.clone());
    let n = data.payment_intents.len();
    Json(json!({
        "clientSecret": format!("pi_{n}_secret_test"),
        "paymentIntentId": format!("pi_{n}"),
    }))
    .into_response()
}

async fn list_users(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if backend.user_id(&headers).is_none() {
        return unauthorized();
    }
    if !backend.is_admin(&headers) {
        return forbidden();
    }
    Json(users()).into_response()
}

async fn list_change_requests(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let admin = backend.is_admin(&headers);
    let visible: Vec<Value> = backend
        .lock()
        .change_requests
        .iter()
        .filter(|r| admin || r["userId"] == user_id)
        .cloned()
        .collect();
    Json(visible).into_response()
}

/// Refuses requests for orders that are no longer pending or processing.
async fn create_change_request(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(user_id) = backend.user_id(&headers) else {
        return unauthorized();
    };
    let mut data = backend.lock();
    let Some(order) = data
        .orders
        .iter()
        .find(|o| o["id"] == body["orderId"] && o["userId"] == user_id)
    else {
        return not_found("Order");
    };
    if !matches!(order["status"].as_str(), Some("PENDING" | "PROCESSING")) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Order can no longer be changed"})),
        )
            .into_response();
    }

    let request = json!({
        "id": data.change_requests.len() + 1,
        "orderId": body["orderId"],
        "userId": user_id,
        "type": body["type"],
        "message": body["message"],
        "status": "PENDING",
        "createdAt": "2026-03-11T10:00:00Z",
    });
    data.change_requests.push(request.clone());
    (StatusCode::CREATED, Json(request)).into_response()
}

async fn empty_admin_list(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if backend.user_id(&headers).is_none() {
        return unauthorized();
    }
    Json(Vec::<Value>::new()).into_response()
}

/// An in-memory stand-in for the REST backend.
pub struct FakeBackend {
    /// Base URL the apps should use as their backend origin.
    pub url: Url,
    backend: Backend,
}

impl FakeBackend {
    /// Start the fake backend on an ephemeral port.
    pub async fn start() -> Self {
        let backend = Backend::with_fixtures();
        let router = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/me", get(me))
            .route("/api/settings", get(settings))
            .route("/api/products", get(list_products))
            .route("/api/products/{id}", get(get_product))
            .route(
                "/api/cart",
                get(get_cart).post(add_to_cart).delete(clear_cart),
            )
            .route("/api/favorites", get(list_favorites).post(add_favorite))
            .route("/api/favorites/{id}", delete(remove_favorite))
            .route("/api/orders", get(list_orders).post(create_order))
            .route("/api/orders/{id}", get(get_order))
            .route("/api/users", get(list_users))
            .route(
                "/api/order-change-requests",
                get(list_change_requests).post(create_change_request),
            )
            .route(
                "/api/payments/create-payment-intent",
                post(create_payment_intent),
            )
            .route("/api/payments", get(empty_admin_list))
            .with_state(backend.clone());

        let addr = serve(router).await;
        Self {
            url: Url::parse(&format!("http://{addr}")).expect("valid backend URL"),
            backend,
        }
    }

    /// Number of successful logins so far.
    #[must_use]
    pub fn logins(&self) -> u32 {
        self.backend.lock().logins
    }

    /// Number of logout calls so far.
    #[must_use]
    pub fn logouts(&self) -> u32 {
        self.backend.lock().logouts
    }

    /// `x-request-id` values seen on product lookups, oldest first.
    #[must_use]
    pub fn product_request_ids(&self) -> Vec<String> {
        self.backend.lock().product_request_ids.clone()
    }

    /// Bodies of `create-payment-intent` calls, oldest first.
    #[must_use]
    pub fn payment_intents(&self) -> Vec<Value> {
        self.backend.lock().payment_intents.clone()
    }

    /// Number of cart lines the given user has.
    #[must_use]
    pub fn cart_lines(&self, user_id: i64) -> usize {
        self.backend.lock().carts.get(&user_id).map_or(0, Vec::len)
    }

    /// Number of change requests submitted.
    #[must_use]
    pub fn change_requests(&self) -> usize {
        self.backend.lock().change_requests.len()
    }

    /// Number of live backend sessions.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.backend.lock().sessions.len()
    }
}

// =============================================================================
// App servers
// =============================================================================

/// Serve a router on `127.0.0.1:0` with peer addresses available to
/// extractors, and return the bound address.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server failed");
    });
    addr
}

fn test_secret() -> SecretString {
    SecretString::from("k7#Qw2!Zr9$Lm4^Tx8&Vb1*Np6%Hs3@".repeat(3))
}

/// Start the storefront against `backend`; returns its base URL.
pub async fn start_storefront(backend: &FakeBackend) -> String {
    use printloom_storefront::config::{BackendConfig, StorefrontConfig};

    let config = StorefrontConfig {
        host: "127.0.0.1".parse().expect("loopback address"),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: test_secret(),
        backend: BackendConfig {
            api_url: backend.url.clone(),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::ZERO,
        },
        stripe_publishable_key: "pk_test_printloom".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = printloom_storefront::state::AppState::new(config).expect("storefront state");
    let app = printloom_storefront::app(state).expect("storefront router");
    format!("http://{}", serve(app).await)
}

/// Start the admin console against `backend`; returns its base URL.
pub async fn start_admin(backend: &FakeBackend) -> String {
    use printloom_admin::config::AdminConfig;

    let config = AdminConfig {
        host: "127.0.0.1".parse().expect("loopback address"),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: test_secret(),
        api_url: backend.url.clone(),
        backend_timeout: Duration::from_secs(5),
        backend_cache_ttl: Duration::ZERO,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = printloom_admin::state::AppState::new(config).expect("admin state");
    let app = printloom_admin::app(state).expect("admin router");
    format!("http://{}", serve(app).await)
}

/// A client that keeps cookies and follows redirects, like a browser.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("HTTP client")
}

/// A cookie-keeping client that stops at redirects so tests can inspect
/// `Location`.
#[must_use]
pub fn browser_no_redirects() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("HTTP client")
}
