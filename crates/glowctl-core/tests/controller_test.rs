// End-to-end tests for the async `Controller` against a wiremock bridge.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use glowctl_api::{BulbClient, TransportConfig};
use glowctl_core::{
    ApiFlavor, BrightnessScale, Channel, Controller, ControllerHandle, CoreError, DeviceCommand,
    Engine, EngineConfig, EngineEvent, Health, NoticeLevel,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn mount_api_status(server: &MockServer, kelvin: u16, brightness: u16) {
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "power": true,
            "kelvin": kelvin,
            "brightness": brightness
        })))
        .mount(server)
        .await;
}

async fn wait_for_health(events: &mut broadcast::Receiver<EngineEvent>) -> Health {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let EngineEvent::Health(health) = events.recv().await.unwrap() {
                return health;
            }
        }
    })
    .await
    .unwrap()
}

/// Spawn a controller and wait for its start-up probe to settle.
async fn setup(
    server: &MockServer,
    flavor: ApiFlavor,
    config: EngineConfig,
) -> (JoinHandle<Engine>, ControllerHandle, broadcast::Receiver<EngineEvent>, Health) {
    let url = Url::parse(&server.uri()).unwrap();
    let client = BulbClient::new(url, flavor, &TransportConfig::default()).unwrap();
    let (controller, handle) = Controller::with_client(client, config);
    let mut events = controller.subscribe();
    let task = tokio::spawn(controller.run());
    let health = wait_for_health(&mut events).await;
    (task, handle, events, health)
}

async fn finish(task: JoinHandle<Engine>, handle: ControllerHandle) -> Engine {
    drop(handle);
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .unwrap()
        .unwrap()
}

fn drain(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

async fn bodies(server: &MockServer, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == route)
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}

// ── Start-up probe ──────────────────────────────────────────────────

#[tokio::test]
async fn test_startup_probe_adopts_device_state() {
    let server = MockServer::start().await;
    mount_api_status(&server, 3000, 30).await;

    let (task, handle, _events, health) = setup(&server, ApiFlavor::Api, EngineConfig::default()).await;
    let engine = finish(task, handle).await;

    assert_eq!(health, Health::Reachable);
    assert_eq!(engine.state().kelvin, 3000);
    assert_eq!(engine.state().brightness, 30);
    assert_eq!(engine.channel(Channel::Kelvin).last_sent(), 3000);
    assert!(engine.state().connected);
}

#[tokio::test]
async fn test_bridge_state_fetch_failure_is_silent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connected": true })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get-state"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = EngineConfig::for_scale(BrightnessScale::Permille);
    let (task, handle, mut events, health) = setup(&server, ApiFlavor::Bridge, config).await;
    let engine = finish(task, handle).await;

    assert_eq!(health, Health::Reachable);
    assert_eq!(engine.state().brightness, 500, "defaults kept");
    assert!(engine.state().synced_at.is_none());
    let errors = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::Notice(n) if n.level == NoticeLevel::Error))
        .count();
    assert_eq!(errors, 0);
}

#[tokio::test]
async fn test_slow_status_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "connected": true }))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let mut config = EngineConfig::default();
    config.probe_timeout = Duration::from_millis(100);
    let (task, handle, _events, health) = setup(&server, ApiFlavor::Bridge, config).await;
    let engine = finish(task, handle).await;

    assert_eq!(health, Health::TimedOut);
    assert!(!engine.state().connected);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_release_sends_final_value_once() {
    let server = MockServer::start().await;
    mount_api_status(&server, 4500, 50).await;
    Mock::given(method("POST"))
        .and(path("/api/temperature"))
        .and(body_json(json!({ "kelvin": 3000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Temperature set to 3000K"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (task, handle, _events, _) = setup(&server, ApiFlavor::Api, EngineConfig::default()).await;
    handle.release(Channel::Kelvin, 3000).await.unwrap();
    let engine = finish(task, handle).await;

    assert_eq!(engine.state().kelvin, 3000);
    assert_eq!(engine.stats().commands, 1);
}

#[tokio::test]
async fn test_rejected_command_rolls_back() {
    let server = MockServer::start().await;
    mount_api_status(&server, 4500, 50).await;
    Mock::given(method("POST"))
        .and(path("/api/brightness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Bulb not connected"
        })))
        .mount(&server)
        .await;

    let (task, handle, _events, _) = setup(&server, ApiFlavor::Api, EngineConfig::default()).await;
    handle.release(Channel::Brightness, 80).await.unwrap();
    let engine = finish(task, handle).await;

    assert_eq!(engine.state().brightness, 50);
    assert_eq!(engine.health(), Health::Unreachable);
    assert_eq!(engine.stats().failures, 1);
}

#[tokio::test]
async fn test_drag_burst_is_coalesced() {
    let server = MockServer::start().await;
    mount_api_status(&server, 4500, 10).await;
    Mock::given(method("POST"))
        .and(path("/api/brightness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let (task, handle, _events, _) = setup(&server, ApiFlavor::Api, EngineConfig::default()).await;
    for value in (10..=100).step_by(2) {
        handle.drag(Channel::Brightness, value).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.release(Channel::Brightness, 100).await.unwrap();
    let engine = finish(task, handle).await;

    let sent = bodies(&server, "/api/brightness").await;
    assert!(!sent.is_empty());
    assert!(sent.len() <= 6, "46 samples should collapse to a few commands, got {}", sent.len());
    assert!(sent.contains(&json!({ "brightness": 100 })));
    assert_eq!(engine.stats().samples, 46);
    assert_eq!(engine.state().brightness, 100);
}

#[tokio::test]
async fn test_bridge_power_uses_state_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connected": false })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/power"))
        .and(body_json(json!({ "state": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Bulb turned off" })))
        .expect(1)
        .mount(&server)
        .await;

    let (task, handle, _events, health) = setup(&server, ApiFlavor::Bridge, EngineConfig::default()).await;
    assert_eq!(health, Health::Unreachable);

    handle.toggle_power().await.unwrap();
    let engine = finish(task, handle).await;

    assert!(!engine.state().power);
    assert_eq!(engine.health(), Health::Reachable, "a good command proves reachability");
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_shutdown_stops_promptly() {
    let server = MockServer::start().await;
    mount_api_status(&server, 4500, 50).await;

    let (task, handle, _events, _) = setup(&server, ApiFlavor::Api, EngineConfig::default()).await;
    handle.drag(Channel::Kelvin, 6500).await.unwrap();
    handle.shutdown();

    let mut engine = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
    assert!(engine.take_outbox().is_empty());
    assert!(handle.probe().await.is_err());
}

// ── Command timeouts ────────────────────────────────────────────────

#[tokio::test]
async fn test_slow_command_reports_transport_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/brightness"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig::default().with_timeout(Duration::from_millis(50));
    let client = BulbClient::new(Url::parse(&server.uri()).unwrap(), ApiFlavor::Api, &transport).unwrap();
    let command = DeviceCommand::Set {
        channel: Channel::Brightness,
        value: 80,
        previous: 50,
    };

    let err = command.send(&client).await.unwrap_err();
    assert!(matches!(err, CoreError::Timeout { timeout_ms: 50 }), "got {err:?}");
    assert_eq!(err.to_string(), "Bridge did not answer within 50ms");
}
