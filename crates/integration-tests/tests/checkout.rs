//! Checkout gating and the one-time payment hand-off.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use koosdoos_integration_tests::{FakeGateway, PAYMENT_URL, TestApp, cape_town_address, customer};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

async fn checkout(app: &TestApp) -> reqwest::Response {
    app.post(
        "/checkout",
        &json!({ "customer": customer(), "address": cape_town_address() }),
    )
    .await
}

#[tokio::test]
async fn test_handoff_renders_once_and_clears_cart() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    app.add_to_cart("2", "v2", 2).await;
    let resp = app
        .post("/shipping/quote", &json!({ "province": "Western Cape" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = checkout(&app).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/checkout/redirect")
    );

    let sent = gateway.requests();
    assert_eq!(sent.len(), 1);
    let body = &sent[0];
    assert_eq!(body["cart_lines"][0]["variant_id"], "v2");
    assert_eq!(body["cart_lines"][0]["quantity"], 2);
    assert_eq!(body["cart_lines"][0]["title"], "KoosDoos Medium - Medium");
    assert_eq!(body["shipping_address"]["province"], "Western Cape");
    assert_eq!(body["shipping_address"]["country"], "ZA");
    assert_eq!(body["selected_shipping_quote"]["service_type"], "standard");
    assert_eq!(body["customer"]["email"], "thandi@example.co.za");

    let resp = app.get("/checkout/redirect").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains(PAYMENT_URL));
    assert!(html.contains(r#"name="m_payment_id""#));
    assert!(html.contains("ORD-1001"));

    let resp = app.get("/checkout/redirect").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/cart")
    );

    let cart: Value = app.get("/cart").await.json().await.unwrap();
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_concurrent_submits_create_one_order() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    app.add_to_cart("1", "v1", 1).await;
    app.post("/shipping/quote", &json!({ "province": "Western Cape" }))
        .await;

    let (first, second) = tokio::join!(checkout(&app), checkout(&app));
    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::SEE_OTHER, StatusCode::UNPROCESSABLE_ENTITY]);
    assert_eq!(gateway.requests().len(), 1);
}

#[tokio::test]
async fn test_submit_cleans_postal_code() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    app.add_to_cart("1", "v1", 1).await;
    app.post("/shipping/quote", &json!({ "province": "Western Cape" }))
        .await;

    let mut address = cape_town_address();
    address["postal_code"] = json!("80-01");
    let resp = app
        .post("/checkout", &json!({ "customer": customer(), "address": address }))
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(gateway.requests()[0]["shipping_address"]["postal_code"], "8001");
}

#[tokio::test]
async fn test_checkout_gates() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    // Empty cart
    let resp = checkout(&app).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // No shipping selected
    app.add_to_cart("1", "v1", 1).await;
    let resp = checkout(&app).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "no shipping option selected");

    // Invalid address reports the failing fields
    app.post("/shipping/quote", &json!({ "province": "Gauteng" })).await;
    let mut address = cape_town_address();
    address["postal_code"] = json!("80");
    address["city"] = json!("  ");
    let resp = app
        .post("/checkout", &json!({ "customer": customer(), "address": address }))
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["fields"]["postal_code"], "Valid postal code is required");
    assert_eq!(err["fields"]["city"], "City is required");

    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn test_inventory_is_checked_before_handoff() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    app.add_to_cart("4", "v4", 7).await;
    app.post("/shipping/quote", &json!({ "province": "Gauteng" })).await;

    let resp = checkout(&app).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["issues"][0]["variant_id"], "v4");
    assert_eq!(
        err["issues"][0]["message"],
        "KoosDoos XL (KDS-XL): Only 6 available, 7 requested"
    );

    // Nothing was handed off and the cart is untouched
    assert!(gateway.requests().is_empty());
    let cart: Value = app.get("/cart").await.json().await.unwrap();
    assert_eq!(cart["item_count"], 7);
}

#[tokio::test]
async fn test_redirect_without_handoff_goes_to_cart() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    let resp = app.get("/checkout/redirect").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_address_report() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    let mut body = cape_town_address();
    body["postal_code"] = json!("8001 ZA");
    let report: Value = app.post("/checkout/address", &body).await.json().await.unwrap();
    assert_eq!(report["is_valid"], true);
    assert_eq!(report["country"], "ZA");
    assert_eq!(report["address"]["postal_code"], "8001");
    assert_eq!(report["errors"], json!({}));

    let report: Value = app
        .post(
            "/checkout/address",
            &json!({ "street": "1 Main Rd", "touched": ["street", "suburb"] }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(report["is_valid"], false);
    assert_eq!(report["errors"], json!({ "suburb": "Suburb is required" }));
}
