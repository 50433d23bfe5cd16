use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use url::Url;

use spotremote::auth::{Navigator, TokenStore};
use spotremote::config::Config;
use spotremote::playback::{PlaybackController, SpotifyApi};
use spotremote::storage::MemoryStore;

/// Navigator that records every call instead of opening a browser
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingNavigator {
    pub navigated: Mutex<Vec<Url>>,
    pub replaced: Mutex<Vec<Url>>,
}

#[allow(dead_code)]
impl RecordingNavigator {
    pub fn navigated(&self) -> Vec<Url> {
        self.navigated.lock().unwrap().clone()
    }

    pub fn replaced(&self) -> Vec<Url> {
        self.replaced.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &Url) {
        self.navigated.lock().unwrap().push(url.clone());
    }

    fn replace_location(&self, url: &Url) {
        self.replaced.lock().unwrap().push(url.clone());
    }
}

/// Config whose accounts and API bases both point at `base`
#[allow(dead_code)]
pub fn config_for(base: &str) -> Config {
    let mut config = Config::default();
    config.spotify.client_id = "test-client-id".to_string();
    config.spotify.accounts_base = base.to_string();
    config.spotify.api_base = base.to_string();
    config
}

/// Token store over a fresh in-memory map holding `token` for an hour
#[allow(dead_code)]
pub fn token_store_with(token: &str) -> (Arc<MemoryStore>, Arc<TokenStore>) {
    let kv = Arc::new(MemoryStore::new());
    let tokens = Arc::new(TokenStore::new(kv.clone()));
    tokens
        .set(token, Utc::now() + chrono::Duration::hours(1))
        .expect("seed token");
    (kv, tokens)
}

/// Controller against `base`, authenticated with bearer `T`
#[allow(dead_code)]
pub fn controller_for(base: &str, refresh_delay: Duration) -> PlaybackController {
    let (_kv, tokens) = token_store_with("T");
    let api = SpotifyApi::new(Arc::new(reqwest::Client::new()), base, tokens);
    PlaybackController::new(Arc::new(api), refresh_delay)
}

/// A `currently-playing` body for one track
#[allow(dead_code)]
pub fn track_body(id: &str, name: &str, release_date: &str) -> serde_json::Value {
    serde_json::json!({
        "is_playing": true,
        "item": {
            "id": id,
            "name": name,
            "artists": [{"name": "Artist One"}, {"name": "Artist Two"}],
            "album": {"release_date": release_date}
        }
    })
}
