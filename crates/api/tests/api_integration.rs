//! Integration tests for the API server.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`
//! against the in-memory store, covering the happy-path shop flow and the
//! HTTP status mapping of each error class.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_state(InMemoryStore::new());
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn seed_category(app: &axum::Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/catalog/categories",
        Some(json!({ "name": name, "parent_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn seed_product(app: &axum::Router, sku: &str, cents: i64, category_id: i64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/catalog/products",
        Some(json!({
            "sku": sku,
            "name": format!("Product {sku}"),
            "description": null,
            "price": cents,
            "discount_price": null,
            "stock": 10,
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn seed_user(app: &axum::Router, email: &str) -> String {
    let (status, body) = send(app, "POST", "/users", Some(json!({ "email": email }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_full_shop_flow() {
    let app = setup();

    let category_id = seed_category(&app, "tools").await;
    let widget = seed_product(&app, "SKU-001", 1000, category_id).await;
    let gadget = seed_product(&app, "SKU-002", 250, category_id).await;
    let user_id = seed_user(&app, "alice@example.com").await;

    // Fill the cart.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/cart/{user_id}/items"),
        Some(json!({ "product_id": widget, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, line) = send(
        &app,
        "POST",
        &format!("/cart/{user_id}/items"),
        Some(json!({ "product_id": gadget, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Bump the second line to 4.
    let line_id = line["id"].as_i64().unwrap();
    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/cart/{user_id}/items/{line_id}"),
        Some(json!({ "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 4);

    // Checkout converts the cart into an order.
    let (status, checkout) = send(
        &app,
        "POST",
        &format!("/cart/{user_id}/checkout"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(checkout["order"]["total"], json!(2 * 1000 + 4 * 250));
    assert_eq!(checkout["order"]["status"], "created");
    assert_eq!(checkout["lines"].as_array().unwrap().len(), 2);

    // The cart is now empty.
    let (status, cart) = send(&app, "GET", &format!("/cart/{user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart.as_array().unwrap().is_empty());

    // The order shows up in the user's history and by id.
    let (status, orders) = send(&app, "GET", &format!("/users/{user_id}/orders"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let order_id = checkout["order"]["id"].as_i64().unwrap();
    let (status, loaded) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["order"]["id"], json!(order_id));
    assert_eq!(loaded["lines"].as_array().unwrap().len(), 2);

    // Walk the status machine.
    let (status, paid) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/status"),
        Some(json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
}

#[tokio::test]
async fn test_category_listing_includes_direct_children() {
    let app = setup();

    let (_, root) = send(
        &app,
        "POST",
        "/catalog/categories",
        Some(json!({ "name": "electronics", "parent_id": null })),
    )
    .await;
    let root_id = root["id"].as_i64().unwrap();
    let (_, child) = send(
        &app,
        "POST",
        "/catalog/categories",
        Some(json!({ "name": "phones", "parent_id": root_id })),
    )
    .await;
    let child_id = child["id"].as_i64().unwrap();

    seed_product(&app, "SKU-ROOT", 100, root_id).await;
    seed_product(&app, "SKU-CHILD", 200, child_id).await;

    let (status, products) = send(
        &app,
        "GET",
        &format!("/catalog/categories/{root_id}/products"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_product_patch_updates_price() {
    let app = setup();
    let category_id = seed_category(&app, "tools").await;
    let product_id = seed_product(&app, "SKU-001", 1000, category_id).await;

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/catalog/products/{product_id}"),
        Some(json!({ "price": 1500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], json!(1500));
    assert_eq!(updated["sku"], "SKU-001");
}

#[tokio::test]
async fn test_not_found_responses() {
    let app = setup();
    let user_id = seed_user(&app, "alice@example.com").await;

    let (status, _) = send(&app, "GET", "/catalog/products/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/orders/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/cart/{user_id}/items"),
        Some(json!({ "product_id": 404, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("product"));
}

#[tokio::test]
async fn test_conflict_responses() {
    let app = setup();
    let category_id = seed_category(&app, "tools").await;
    let product_id = seed_product(&app, "SKU-001", 1000, category_id).await;
    let user_id = seed_user(&app, "alice@example.com").await;

    // Duplicate SKU.
    let (status, _) = send(
        &app,
        "POST",
        "/catalog/products",
        Some(json!({
            "sku": "SKU-001",
            "name": "Duplicate",
            "description": null,
            "price": 1,
            "discount_price": null,
            "stock": 1,
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Duplicate email.
    let (status, _) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "email": "alice@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Second add of the same product to the same cart.
    send(
        &app,
        "POST",
        &format!("/cart/{user_id}/items"),
        Some(json!({ "product_id": product_id, "quantity": 1 })),
    )
    .await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/cart/{user_id}/items"),
        Some(json!({ "product_id": product_id, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Illegal status transition.
    let (_, checkout) = send(&app, "POST", &format!("/cart/{user_id}/checkout"), None).await;
    let order_id = checkout["order"]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/status"),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bad_request_responses() {
    let app = setup();
    let category_id = seed_category(&app, "tools").await;
    let product_id = seed_product(&app, "SKU-001", 1000, category_id).await;
    let user_id = seed_user(&app, "alice@example.com").await;

    // Zero quantity.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/cart/{user_id}/items"),
        Some(json!({ "product_id": product_id, "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Checkout of an empty cart.
    let (status, body) = send(&app, "POST", &format!("/cart/{user_id}/checkout"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("empty"));

    // Malformed email.
    let (status, _) = send(&app, "POST", "/users", Some(json!({ "email": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_lines_are_owner_scoped() {
    let app = setup();
    let category_id = seed_category(&app, "tools").await;
    let product_id = seed_product(&app, "SKU-001", 1000, category_id).await;
    let alice = seed_user(&app, "alice@example.com").await;
    let bob = seed_user(&app, "bob@example.com").await;

    let (_, line) = send(
        &app,
        "POST",
        &format!("/cart/{alice}/items"),
        Some(json!({ "product_id": product_id, "quantity": 1 })),
    )
    .await;
    let line_id = line["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/cart/{bob}/items/{line_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/cart/{alice}/items/{line_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
