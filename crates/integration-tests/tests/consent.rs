//! Cookie consent endpoints.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use koosdoos_integration_tests::{FakeGateway, TestApp};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_consent_round_trip() {
    let gateway = FakeGateway::start().await;
    let app = TestApp::spawn(None, &gateway).await;

    let stored: Value = app.get("/api/consent").await.json().await.unwrap();
    assert_eq!(stored, Value::Null);

    let resp = app
        .post(
            "/api/consent",
            &json!({ "functional": true, "analytics": false, "marketing": false }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored: Value = app.get("/api/consent").await.json().await.unwrap();
    assert_eq!(stored["essential"], true);
    assert_eq!(stored["functional"], true);
    assert_eq!(stored["analytics"], false);
    assert!(stored["timestamp"].as_i64().unwrap() > 0);

    app.post("/api/consent", &json!({ "preset": "accept_all" })).await;
    let stored: Value = app.get("/api/consent").await.json().await.unwrap();
    assert_eq!(stored["marketing"], true);
}
