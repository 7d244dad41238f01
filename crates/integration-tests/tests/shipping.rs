//! Shipping quotes: courier first, fallback table otherwise.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use koosdoos_integration_tests::{CourierBehaviour, FakeCourier, FakeGateway, TestApp};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn quote(app: &TestApp, body: &Value) -> (StatusCode, Value) {
    let resp = app.post("/shipping/quote", body).await;
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

fn courier_quotes() -> Value {
    json!([
        { "service_type": "express", "service_name": "Courier Express", "price": 180.5, "estimated_days": 1 },
        { "service_type": "standard", "service_name": "Courier Road", "price": 99.0, "estimated_days": 3 }
    ])
}

#[tokio::test]
async fn test_fallback_without_courier() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    let (status, view) = quote(&app, &json!({ "province": "Gauteng", "package_size": "medium", "quantity": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["origin"], "fallback");
    assert_eq!(view["province"], "Gauteng");
    assert_eq!(view["selected_service"], "standard");

    let quotes = view["quotes"].as_array().unwrap();
    assert_eq!(quotes.len(), 3);
    assert_eq!(quotes[0]["service_type"], "standard");
    assert_eq!(quotes[0]["price"], 215.0);
    assert_eq!(quotes[0]["display_price"], "R215");
    assert_eq!(quotes[0]["delivery_estimate"], "2 business days");
}

#[tokio::test]
async fn test_remote_quotes_are_used_and_cached() {
    let courier = FakeCourier::start(CourierBehaviour::Quotes(courier_quotes())).await;
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(Some(&courier), &gateway).await;

    let body = json!({ "province": "KwaZulu-Natal", "package_size": "small", "quantity": 2 });
    let (status, view) = quote(&app, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["origin"], "remote");
    assert_eq!(view["selected_service"], "standard");
    assert_eq!(view["quotes"][0]["service_name"], "Courier Express");

    let (_, again) = quote(&app, &body).await;
    assert_eq!(again["quotes"], view["quotes"]);
    assert_eq!(courier.hits(), 1);
}

#[tokio::test]
async fn test_courier_failures_fall_back() {
    for behaviour in [
        CourierBehaviour::Status(503),
        CourierBehaviour::Garbage,
        CourierBehaviour::Quotes(json!([])),
    ] {
        let courier = FakeCourier::start(behaviour.clone()).await;
        let gateway = FakeGateway::start().await;
        let app = TestApp::spawn(Some(&courier), &gateway).await;

        let (status, view) = quote(&app, &json!({ "province": "Northern Cape" })).await;
        assert_eq!(status, StatusCode::OK, "{behaviour:?}");
        assert_eq!(view["origin"], "fallback", "{behaviour:?}");
        assert_eq!(view["quotes"].as_array().unwrap().len(), 3);
        assert_eq!(courier.hits(), 1);
    }
}

#[tokio::test]
async fn test_courier_timeout_falls_back() {
    let courier = FakeCourier::start(CourierBehaviour::Slow(Duration::from_secs(2))).await;
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn_with_timeout(Some(&courier), &gateway, Duration::from_millis(200)).await;

    let (status, view) = quote(&app, &json!({ "province": "Limpopo" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["origin"], "fallback");
}

#[tokio::test]
async fn test_package_profile_comes_from_cart() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;
    app.add_to_cart("1", "v1", 1).await;
    app.add_to_cart("4", "v4", 1).await;

    let (_, from_cart) = quote(&app, &json!({ "province": "Gauteng" })).await;
    let (_, explicit) = quote(
        &app,
        &json!({ "province": "Gauteng", "package_size": "xl", "quantity": 2 }),
    )
    .await;
    assert_eq!(from_cart["quotes"], explicit["quotes"]);
}

#[tokio::test]
async fn test_missing_or_unknown_province_is_rejected() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    for body in [json!({}), json!({ "province": "" }), json!({ "province": "Bavaria" })] {
        let (status, err) = quote(&app, &body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"], "Please select a province");
    }
}

#[tokio::test]
async fn test_select_service() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    let resp = app.post("/shipping/select", &json!({ "service_type": "express" })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    quote(&app, &json!({ "province": "Free State" })).await;

    let resp = app.post("/shipping/select", &json!({ "service_type": "express" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["selected_service"], "express");

    // A new lookup keeps the buyer's choice
    let (_, view) = quote(&app, &json!({ "province": "Free State" })).await;
    assert_eq!(view["selected_service"], "express");

    let resp = app.post("/shipping/select", &json!({ "service_type": "pigeon" })).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
