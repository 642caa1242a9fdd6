//! Checkout and order history over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use toko_integration_tests::TestApp;

fn address() -> Value {
    json!({
        "name": "Budi Santoso",
        "phone": "081234567890",
        "full_address": "Jl. Merdeka No. 1, Bandung"
    })
}

#[tokio::test]
async fn checkout_places_order_and_purges_selected_lines() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let mouse = app.create_product(&cookie, "Mouse Wireless", 250_000, 10).await;
    let keyboard = app.create_product(&cookie, "Keyboard", 850_000, 10).await;
    app.add_to_cart(&cookie, mouse, 2).await;
    let kept = app.add_to_cart(&cookie, keyboard, 1).await;
    app.put(&format!("/api/cart/{kept}"), json!({ "selected": false }), Some(&cookie))
        .await;

    let response = app
        .post(
            "/api/orders",
            json!({
                "items": [
                    { "product_id": mouse, "quantity": 2, "name": "ignored", "price": 1 }
                ],
                "shipping_address": address(),
                "payment_method": "Transfer Bank",
                "payment_status": "pending",
                "summary": {
                    "subtotal": 1,
                    "shipping_cost": 20_000,
                    "service_fee": 1_000,
                    "discount": 5_000,
                    "grand_total": 1
                }
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
    let order_id = response.body["order_id"].as_i64().unwrap();

    let order = app.get(&format!("/api/orders/{order_id}"), Some(&cookie)).await;
    assert_eq!(order.status, StatusCode::OK);
    assert_eq!(order.body["payment_status"], "paid");
    assert_eq!(order.body["order_status"], "processing");
    assert_eq!(order.body["shipping_method"], "Reguler");
    assert_eq!(order.body["items"][0]["name"], "Mouse Wireless");
    assert_eq!(order.body["items"][0]["price"], 250_000);
    assert_eq!(order.body["summary"]["subtotal"], 500_000);
    assert_eq!(order.body["summary"]["grand_total"], 516_000);

    let cart = app.get("/api/cart", Some(&cookie)).await;
    let lines = cart.body.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], kept);
}

#[tokio::test]
async fn empty_order_is_rejected_and_nothing_is_stored() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;

    let response = app
        .post(
            "/api/orders",
            json!({ "items": [], "shipping_address": address(), "payment_method": "COD" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.get("/api/orders", Some(&cookie)).await.body, json!([]));
}

#[tokio::test]
async fn incomplete_address_is_rejected() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;
    let mouse = app.create_product(&cookie, "Mouse", 250_000, 10).await;
    let line = app.add_to_cart(&cookie, mouse, 1).await;

    let response = app
        .post(
            "/api/orders",
            json!({
                "items": [{ "product_id": mouse, "quantity": 1 }],
                "shipping_address": { "name": "Budi", "phone": "", "full_address": "Bandung" },
                "payment_method": "COD"
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Cart is untouched by a failed checkout.
    let cart = app.get("/api/cart", Some(&cookie)).await;
    assert_eq!(cart.body[0]["id"], line);
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let app = TestApp::new();
    let cookie = app.login_as("budi").await;

    let response = app
        .post(
            "/api/orders",
            json!({
                "items": [{ "product_id": 777, "quantity": 1 }],
                "shipping_address": address(),
                "payment_method": "COD"
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_history_is_newest_first_and_private() {
    let app = TestApp::new();
    let budi = app.login_as("budi").await;
    let sari = app.login_as("sari").await;
    let mouse = app.create_product(&budi, "Mouse", 250_000, 10).await;

    let mut ids = Vec::new();
    for quantity in [1, 2] {
        let response = app
            .post(
                "/api/orders",
                json!({
                    "items": [{ "product_id": mouse, "quantity": quantity }],
                    "shipping_address": address(),
                    "shipping_method": "Ekspres",
                    "payment_method": "COD"
                }),
                Some(&budi),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        ids.push(response.body["order_id"].clone());
    }

    let history = app.get("/api/orders", Some(&budi)).await;
    let orders = history.body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], ids[1]);
    assert_eq!(orders[1]["id"], ids[0]);
    assert_eq!(orders[0]["shipping_method"], "Ekspres");

    assert_eq!(app.get("/api/orders", Some(&sari)).await.body, json!([]));
    let foreign = app
        .get(&format!("/api/orders/{}", ids[0]), Some(&sari))
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
}
