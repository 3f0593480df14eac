mod common;

use common::{test_config, StubBehavior, StubGateway, TestApp};
use reqwest::Client;

async fn spawn() -> TestApp {
    let gateway = StubGateway::new(StubBehavior::CheckoutUrl("https://gateway.example".into()));
    TestApp::spawn_with_gateway(test_config("http://unused"), gateway).await
}

#[tokio::test]
async fn root_returns_liveness_text() {
    let app = spawn().await;

    let response = Client::new()
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(
        response.text().await.unwrap(),
        "SSLCommerz backend with deep link redirect is working!"
    );
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn().await;

    let response = Client::new()
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "payment-relay-test");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = spawn().await;

    let response = Client::new()
        .get(app.url("/health"))
        .header("x-request-id", "probe-1")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.headers()["x-request-id"], "probe-1");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}
