// Integration tests for `BulbClient` using wiremock.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use glowctl_api::{ApiFlavor, BulbClient, DeviceState, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(flavor: ApiFlavor) -> (MockServer, BulbClient) {
    let server = MockServer::start().await;
    let client = BulbClient::from_reqwest(&server.uri(), reqwest::Client::new(), flavor).unwrap();
    (server, client)
}

// ── api route style ─────────────────────────────────────────────────

#[tokio::test]
async fn test_api_status_carries_state() {
    let (server, client) = setup(ApiFlavor::Api).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "power": true,
            "kelvin": 5000,
            "brightness": 70
        })))
        .mount(&server)
        .await;

    let report = client.status().await.unwrap();

    assert!(report.connected);
    assert_eq!(
        report.state,
        Some(DeviceState {
            power: true,
            kelvin: 5000,
            brightness: 70,
        })
    );
}

#[tokio::test]
async fn test_api_status_failure_envelope() {
    let (server, client) = setup(ApiFlavor::Api).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "bulb offline" })),
        )
        .mount(&server)
        .await;

    let err = client.status().await.unwrap_err();
    assert!(matches!(err, Error::Rejected { ref message } if message == "bulb offline"));
}

#[tokio::test]
async fn test_api_power_body() {
    let (server, client) = setup(ApiFlavor::Api).await;

    Mock::given(method("POST"))
        .and(path("/api/power"))
        .and(body_json(json!({ "power": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "message": "Bulb turned ON" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let message = client.set_power(true).await.unwrap();
    assert_eq!(message.as_deref(), Some("Bulb turned ON"));
}

#[tokio::test]
async fn test_api_temperature_uses_kelvin_key() {
    let (server, client) = setup(ApiFlavor::Api).await;

    Mock::given(method("POST"))
        .and(path("/api/temperature"))
        .and(body_json(json!({ "kelvin": 4600 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_kelvin(4600).await.unwrap();
}

#[tokio::test]
async fn test_api_command_rejected() {
    let (server, client) = setup(ApiFlavor::Api).await;

    Mock::given(method("POST"))
        .and(path("/api/brightness"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "Bulb not connected" })),
        )
        .mount(&server)
        .await;

    let err = client.set_brightness(80).await.unwrap_err();
    assert!(err.is_rejection());
    assert!(err.to_string().contains("Bulb not connected"));
}

// ── bridge route style ──────────────────────────────────────────────

#[tokio::test]
async fn test_bridge_status_has_no_state() {
    let (server, client) = setup(ApiFlavor::Bridge).await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connected": false })))
        .mount(&server)
        .await;

    let report = client.status().await.unwrap();
    assert!(!report.connected);
    assert_eq!(report.state, None);
}

#[tokio::test]
async fn test_bridge_get_state_normalizes_raw_temperature() {
    let (server, client) = setup(ApiFlavor::Bridge).await;

    Mock::given(method("GET"))
        .and(path("/get-state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "state": { "power": true, "brightness": 500, "temperature": 500 }
        })))
        .mount(&server)
        .await;

    let state = client.fetch_state().await.unwrap();
    assert_eq!(
        state,
        DeviceState {
            power: true,
            kelvin: 4600,
            brightness: 500,
        }
    );
}

#[tokio::test]
async fn test_bridge_power_uses_state_key() {
    let (server, client) = setup(ApiFlavor::Bridge).await;

    Mock::given(method("POST"))
        .and(path("/power"))
        .and(body_json(json!({ "state": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_power(false).await.unwrap();
}

#[tokio::test]
async fn test_bridge_temperature_uses_temperature_key() {
    let (server, client) = setup(ApiFlavor::Bridge).await;

    Mock::given(method("POST"))
        .and(path("/temperature"))
        .and(body_json(json!({ "temperature": 3000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.set_kelvin(3000).await.unwrap();
}

// ── Error paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_503_lifts_error_field() {
    let (server, client) = setup(ApiFlavor::Bridge).await;

    Mock::given(method("GET"))
        .and(path("/get-state"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({ "success": false, "error": "Bulb not connected" })),
        )
        .mount(&server)
        .await;

    let err = client.fetch_state().await.unwrap_err();
    match err {
        Error::Http { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Bulb not connected");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_deserialization_error() {
    let (server, client) = setup(ApiFlavor::Api).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.status().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { ref body, .. } if body.contains("oops")));
}

#[tokio::test]
async fn test_slow_bridge_times_out() {
    let server = MockServer::start().await;
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(50))
        .build()
        .unwrap();
    let client = BulbClient::from_reqwest(&server.uri(), http, ApiFlavor::Api)
        .unwrap()
        .with_request_timeout(std::time::Duration::from_millis(50));

    Mock::given(method("POST"))
        .and(path("/api/brightness"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true }))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client.set_brightness(10).await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }), "got {err:?}");
    assert_eq!(err.to_string(), "Request timed out after 50ms");
}

#[tokio::test]
async fn test_timeout_reports_transport_setting() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_timeout(std::time::Duration::from_millis(80));
    let client = BulbClient::new(
        url::Url::parse(&server.uri()).unwrap(),
        ApiFlavor::Bridge,
        &transport,
    )
    .unwrap();
    assert_eq!(client.request_timeout(), std::time::Duration::from_millis(80));

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "connected": true }))
                .set_delay(std::time::Duration::from_millis(600)),
        )
        .mount(&server)
        .await;

    let err = client.status().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 80 }), "got {err:?}");
}

#[tokio::test]
async fn test_api_kelvin_is_taken_as_is() {
    let (server, client) = setup(ApiFlavor::Api).await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "power": true,
            "kelvin": 900,
            "brightness": 40
        })))
        .mount(&server)
        .await;

    let state = client.fetch_state().await.unwrap();
    assert_eq!(state.kelvin, 900);
}
