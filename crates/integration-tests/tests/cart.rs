//! Cart reconciliation over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use toko_integration_tests::TestApp;

#[tokio::test]
async fn add_merges_into_one_line() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let product = app.create_product(&cookie, "Mouse Wireless", 250_000, 10).await;

    let first = app.add_to_cart(&cookie, product, 2).await;
    let second = app.add_to_cart(&cookie, product, 3).await;
    assert_eq!(first, second);

    let cart = app.get("/api/cart", Some(&cookie)).await;
    let lines = cart.body.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 5);
    assert_eq!(lines[0]["selected"], true);
    assert_eq!(lines[0]["product_info"]["name"], "Mouse Wireless");
    assert_eq!(lines[0]["product_info"]["price"], 250_000);
}

#[tokio::test]
async fn exceeding_stock_reports_remaining_and_keeps_quantity() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let product = app.create_product(&cookie, "Keyboard", 850_000, 5).await;
    app.add_to_cart(&cookie, product, 2).await;

    let response = app
        .post(
            "/api/cart",
            json!({ "product_id": product, "quantity": 4 }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["available_stock"], 5);

    let cart = app.get("/api/cart", Some(&cookie)).await;
    assert_eq!(cart.body[0]["quantity"], 2);

    // Stock itself is never touched by the cart.
    let stored = app.get(&format!("/api/products/{product}"), None).await;
    assert_eq!(stored.body["stock"], 5);
}

#[tokio::test]
async fn add_validates_product_and_quantity() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let product = app.create_product(&cookie, "Laptop", 15_000_000, 10).await;

    let zero = app
        .post("/api/cart", json!({ "product_id": product, "quantity": 0 }), Some(&cookie))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let bad_id = app
        .post("/api/cart", json!({ "product_id": "abc", "quantity": 1 }), Some(&cookie))
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post("/api/cart", json!({ "product_id": 9999, "quantity": 1 }), Some(&cookie))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let string_id = app
        .post(
            "/api/cart",
            json!({ "product_id": product.to_string(), "quantity": 1 }),
            Some(&cookie),
        )
        .await;
    assert_eq!(string_id.status, StatusCode::OK);
}

#[tokio::test]
async fn update_and_remove_line() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let product = app.create_product(&cookie, "Laptop", 15_000_000, 3).await;
    let line = app.add_to_cart(&cookie, product, 1).await;

    let updated = app
        .put(
            &format!("/api/cart/{line}"),
            json!({ "quantity": 3, "selected": false }),
            Some(&cookie),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["quantity"], 3);
    assert_eq!(updated.body["selected"], false);

    let too_many = app
        .put(&format!("/api/cart/{line}"), json!({ "quantity": 4 }), Some(&cookie))
        .await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);
    assert_eq!(too_many.body["available_stock"], 3);

    let zero = app
        .put(&format!("/api/cart/{line}"), json!({ "quantity": 0 }), Some(&cookie))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let removed = app.delete(&format!("/api/cart/{line}"), Some(&cookie)).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert!(removed.body["message"].is_string());

    let again = app.delete(&format!("/api/cart/{line}"), Some(&cookie)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lines_are_private_to_their_owner() {
    let app = TestApp::new();
    let budi = app.login_as("budi").await;
    let sari = app.login_as("sari").await;
    let product = app.create_product(&budi, "Laptop", 15_000_000, 3).await;
    let line = app.add_to_cart(&budi, product, 1).await;

    let update = app
        .put(&format!("/api/cart/{line}"), json!({ "quantity": 2 }), Some(&sari))
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let delete = app.delete(&format!("/api/cart/{line}"), Some(&sari)).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get("/api/cart", Some(&sari)).await.body, json!([]));
}

#[tokio::test]
async fn malformed_line_id_is_not_found() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let response = app
        .put("/api/cart/xyz", json!({ "quantity": 1 }), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_products_drop_out_of_the_cart() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let kept = app.create_product(&cookie, "Mouse", 250_000, 5).await;
    let doomed = app.create_product(&cookie, "Keyboard", 850_000, 5).await;
    app.add_to_cart(&cookie, kept, 1).await;
    app.add_to_cart(&cookie, doomed, 1).await;

    app.delete(&format!("/api/products/{doomed}"), Some(&cookie))
        .await;

    let cart = app.get("/api/cart", Some(&cookie)).await;
    let lines = cart.body.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["product_id"], kept);
}
