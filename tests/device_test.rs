//! Device binding integration tests using wiremock

use std::sync::Arc;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotremote::config::DeviceConfig;
use spotremote::device::{PlaybackDevice, Player, TokenProvider};
use spotremote::SpotRemoteError;

fn device_config(name: Option<&str>, attempts: u32) -> DeviceConfig {
    DeviceConfig {
        name: name.map(str::to_string),
        volume: 0.5,
        ready_attempts: attempts,
        ready_interval_ms: 10,
    }
}

fn token(value: &'static str) -> TokenProvider {
    Arc::new(move || Some(value.to_string()))
}

fn devices_body(devices: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "devices": devices }))
}

#[tokio::test]
async fn test_ready_polls_until_device_is_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(devices_body(serde_json::json!([])))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .and(header("Authorization", "Bearer T"))
        .respond_with(devices_body(serde_json::json!([
            {"id": "phone-1", "name": "Phone", "type": "Smartphone"},
            {"id": "dev-42", "name": "spotremote", "type": "Computer"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let device = PlaybackDevice::new(
        device_config(Some("spotremote"), 5),
        token("T"),
        Arc::new(reqwest::Client::new()),
        &server.uri(),
    );

    assert_eq!(device.ready().await.unwrap(), "dev-42");
    assert_eq!(device.device_id().as_deref(), Some("dev-42"));
}

#[tokio::test]
async fn test_ready_times_out_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(devices_body(serde_json::json!([
            {"id": "phone-1", "name": "Phone", "type": "Smartphone"}
        ])))
        .expect(3)
        .mount(&server)
        .await;

    let device = PlaybackDevice::new(
        device_config(Some("spotremote"), 3),
        token("T"),
        Arc::new(reqwest::Client::new()),
        &server.uri(),
    );

    let err = device.ready().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SpotRemoteError>(),
        Some(SpotRemoteError::DeviceUnavailable(_))
    ));
    assert!(device.device_id().is_none());
}

#[tokio::test]
async fn test_connect_transfers_and_sets_volume() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(devices_body(serde_json::json!([
            {"id": "dev-1", "name": "Desk", "type": "Computer"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player"))
        .and(body_json(serde_json::json!({ "device_ids": ["dev-1"] })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/volume"))
        .and(query_param("volume_percent", "50"))
        .and(query_param("device_id", "dev-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let device = PlaybackDevice::new(
        device_config(None, 1),
        token("T"),
        Arc::new(reqwest::Client::new()),
        &server.uri(),
    );

    device.ready().await.unwrap();
    assert!(device.connect().await);
}

#[tokio::test]
async fn test_connect_fails_when_transfer_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(devices_body(serde_json::json!([
            {"id": "dev-1", "name": "Desk", "type": "Computer"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/volume"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let device = PlaybackDevice::new(
        device_config(None, 1),
        token("T"),
        Arc::new(reqwest::Client::new()),
        &server.uri(),
    );

    device.ready().await.unwrap();
    assert!(!device.connect().await);
}

#[tokio::test]
async fn test_connect_before_ready_sends_nothing() {
    let server = MockServer::start().await;

    let device = PlaybackDevice::new(
        device_config(None, 1),
        token("T"),
        Arc::new(reqwest::Client::new()),
        &server.uri(),
    );

    assert!(!device.connect().await);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_connect_fails_when_volume_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(devices_body(serde_json::json!([
            {"id": "dev-1", "name": "Desk", "type": "Computer"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player"))
        .and(header("Authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/volume"))
        .and(header("Authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let device = PlaybackDevice::new(
        device_config(None, 1),
        token("T"),
        Arc::new(reqwest::Client::new()),
        &format!("{}/", server.uri()),
    );

    device.ready().await.unwrap();
    assert!(!device.connect().await);
}
