//! Playback controller integration tests using wiremock
//!
//! Each test mounts the `/me/player` endpoints it expects and lets wiremock
//! verify call counts when the server is dropped.

mod common;

use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotremote::SpotRemoteError;

use common::{controller_for, track_body};

const QUICK: Duration = Duration::from_millis(10);

async fn mount_currently_playing(server: &MockServer, body: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/me/player/currently-playing"))
        .and(header("Authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_toggle_pauses_when_playing_and_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_playing": true,
            "shuffle_state": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/pause"))
        .and(header("Authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/play"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    mount_currently_playing(&server, track_body("t1", "Song", "1999-03-01"), 1).await;

    let controller = controller_for(&server.uri(), QUICK);
    controller.toggle_play_pause().await;

    let now = controller.now_playing().expect("track published");
    assert_eq!(now.track_id, "t1");
    assert_eq!(now.to_string(), "1999 - Artist One, Artist Two - Song");
}

#[tokio::test]
async fn test_toggle_with_no_active_playback_resumes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/play"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), QUICK);
    controller.toggle_play_pause().await;

    assert!(controller.now_playing().is_none());
}

#[tokio::test]
async fn test_next_track_publishes_after_delay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_currently_playing(&server, track_body("t2", "Next Song", "2020"), 1).await;

    let controller = controller_for(&server.uri(), QUICK);
    let mut updates = controller.subscribe();
    controller.next_track().await;

    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("update within timeout")
        .unwrap();
    assert_eq!(updates.borrow().as_ref().unwrap().name, "Next Song");
    assert_eq!(controller.now_playing().unwrap().year, "2020");
}

#[tokio::test]
async fn test_rapid_skips_refresh_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/me/player/previous"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_currently_playing(&server, track_body("t3", "Final", "2001-01-01"), 1).await;

    let controller = controller_for(&server.uri(), Duration::from_millis(200));
    controller.next_track().await;
    controller.next_track().await;
    controller.previous_track().await;
    controller.settle().await;

    assert_eq!(controller.now_playing().unwrap().track_id, "t3");
}

#[tokio::test]
async fn test_immediate_refresh_cancels_pending_delayed_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_currently_playing(&server, track_body("t4", "Now", "2010"), 1).await;

    let controller = controller_for(&server.uri(), Duration::from_millis(200));
    controller.next_track().await;
    controller.refresh_now_playing().await;
    controller.settle().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(controller.now_playing().unwrap().track_id, "t4");
}

#[tokio::test]
async fn test_refresh_without_item_keeps_previous_track() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_body("t5", "Kept", "1980")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_playing": false,
            "item": null
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), QUICK);
    controller.refresh_now_playing().await;
    controller.refresh_now_playing().await;

    assert_eq!(controller.now_playing().unwrap().name, "Kept");
}

#[tokio::test]
async fn test_toggle_shuffle_flips_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_playing": true,
            "shuffle_state": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player/shuffle"))
        .and(query_param("state", "false"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), QUICK);
    controller.toggle_shuffle().await;
}

#[tokio::test]
async fn test_play_playlist_sends_context_uri() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/me/player/play"))
        .and(body_json(serde_json::json!({
            "context_uri": "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_currently_playing(&server, track_body("t6", "Opener", "2015-05-05"), 1).await;

    let controller = controller_for(&server.uri(), QUICK);
    controller
        .play_playlist("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=share")
        .await
        .unwrap();
    controller.settle().await;

    assert_eq!(controller.now_playing().unwrap().name, "Opener");
}

#[tokio::test]
async fn test_invalid_playlist_makes_no_request() {
    let server = MockServer::start().await;

    let controller = controller_for(&server.uri(), QUICK);
    let err = controller
        .play_playlist("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy")
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SpotRemoteError>(),
        Some(SpotRemoteError::InvalidPlaylistUrl(_))
    ));
    controller.settle().await;
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_api_errors_are_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .respond_with(ResponseTemplate::new(404).set_body_string("NO_ACTIVE_DEVICE"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), QUICK);
    controller.next_track().await;
    controller.settle().await;

    assert!(controller.now_playing().is_none());
}

#[tokio::test]
async fn test_list_devices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "devices": [
                {"id": "d1", "name": "Laptop", "type": "Computer", "is_active": true, "volume_percent": 40},
                {"id": "d2", "name": "Kitchen", "type": "Speaker", "is_active": false}
            ]
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri(), QUICK);
    let devices = controller.list_devices().await;

    assert_eq!(devices.len(), 2);
    assert!(devices[0].is_active);
    assert_eq!(devices[0].volume_percent, Some(40));
    assert_eq!(devices[1].device_type, "Speaker");
}
