//! Playback controller
//!
//! Translates user actions into control-plane calls and keeps the
//! now-playing display current. Provider failures are logged and swallowed;
//! the only error a caller sees is an unparseable playlist URL.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::Result;
use crate::playback::client::SpotifyApi;
use crate::playback::playlist::{playlist_context_uri, playlist_id};
use crate::playback::refresh::{RefreshScheduler, RefreshTicket};
use crate::playback::types::{Device, NowPlaying};

/// Default settle delay before re-reading the current track
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(500);

/// Issues playback commands and publishes the current track
pub struct PlaybackController {
    api: Arc<SpotifyApi>,
    now_playing: Arc<watch::Sender<Option<NowPlaying>>>,
    scheduler: RefreshScheduler,
    refresh_delay: Duration,
}

impl PlaybackController {
    /// Creates a controller with nothing published yet
    pub fn new(api: Arc<SpotifyApi>, refresh_delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            api,
            now_playing: Arc::new(tx),
            scheduler: RefreshScheduler::new(),
            refresh_delay,
        }
    }

    /// Receiver that observes every published track
    pub fn subscribe(&self) -> watch::Receiver<Option<NowPlaying>> {
        self.now_playing.subscribe()
    }

    /// The most recently published track
    pub fn now_playing(&self) -> Option<NowPlaying> {
        self.now_playing.borrow().clone()
    }

    /// Pauses when playing, resumes otherwise, then refreshes immediately
    pub async fn toggle_play_pause(&self) {
        let playing = match self.api.playback_state().await {
            Ok(state) => state.map(|s| s.is_playing).unwrap_or(false),
            Err(e) => {
                tracing::warn!("Failed to read playback state: {}", e);
                return;
            }
        };

        let result = if playing {
            self.api.pause().await
        } else {
            self.api.play().await
        };
        if let Err(e) = result {
            tracing::warn!("Failed to toggle playback: {}", e);
        }

        self.refresh_now_playing().await;
    }

    /// Skips forward and schedules a delayed refresh
    pub async fn next_track(&self) {
        if let Err(e) = self.api.next().await {
            tracing::warn!("Failed to skip to next track: {}", e);
        }
        self.schedule_refresh();
    }

    /// Skips back and schedules a delayed refresh
    pub async fn previous_track(&self) {
        if let Err(e) = self.api.previous().await {
            tracing::warn!("Failed to skip to previous track: {}", e);
        }
        self.schedule_refresh();
    }

    /// Flips the shuffle flag
    pub async fn toggle_shuffle(&self) {
        let shuffle = match self.api.playback_state().await {
            Ok(state) => state.map(|s| s.shuffle_state).unwrap_or(false),
            Err(e) => {
                tracing::warn!("Failed to read playback state: {}", e);
                return;
            }
        };

        match self.api.set_shuffle(!shuffle).await {
            Ok(()) => tracing::info!("Shuffle {}", if shuffle { "off" } else { "on" }),
            Err(e) => tracing::warn!("Failed to set shuffle: {}", e),
        }
    }

    /// Starts the playlist behind a share URL
    ///
    /// The URL is parsed before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPlaylistUrl` when no playlist id can be extracted.
    pub async fn play_playlist(&self, url: &str) -> Result<()> {
        let id = playlist_id(url)?;
        let context = playlist_context_uri(&id);

        match self.api.play_context(&context).await {
            Ok(()) => tracing::info!("Playing {}", context),
            Err(e) => tracing::warn!("Failed to start playlist {}: {}", id, e),
        }
        self.schedule_refresh();
        Ok(())
    }

    /// Re-reads the current track now, superseding any pending refresh
    pub async fn refresh_now_playing(&self) {
        let ticket = self.scheduler.supersede();
        fetch_and_publish(&self.api, &self.now_playing, ticket).await;
    }

    /// Lists the user's Connect devices; empty on failure
    pub async fn list_devices(&self) -> Vec<Device> {
        match self.api.devices().await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!("Failed to list devices: {}", e);
                Vec::new()
            }
        }
    }

    /// Waits for a scheduled refresh to land or be superseded
    pub async fn settle(&self) {
        self.scheduler.settle().await;
    }

    fn schedule_refresh(&self) {
        let api = Arc::clone(&self.api);
        let sender = Arc::clone(&self.now_playing);
        self.scheduler.schedule(self.refresh_delay, move |ticket| async move {
            fetch_and_publish(&api, &sender, ticket).await;
        });
    }
}

async fn fetch_and_publish(
    api: &SpotifyApi,
    sender: &watch::Sender<Option<NowPlaying>>,
    ticket: RefreshTicket,
) {
    let current = match api.currently_playing().await {
        Ok(current) => current,
        Err(e) => {
            tracing::warn!("Failed to fetch current track: {}", e);
            return;
        }
    };

    let Some(track) = current.and_then(|c| c.item) else {
        tracing::debug!("Nothing playing; keeping previous track");
        return;
    };

    if !ticket.is_current() {
        tracing::debug!("Dropping stale now-playing response");
        return;
    }

    let now_playing = NowPlaying::from_track(&track);
    tracing::debug!("Now playing: {}", now_playing);
    sender.send_replace(Some(now_playing));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenStore;
    use crate::error::SpotRemoteError;
    use crate::storage::MemoryStore;

    fn controller() -> PlaybackController {
        let tokens = Arc::new(TokenStore::new(Arc::new(MemoryStore::new())));
        let api = SpotifyApi::new(Arc::new(reqwest::Client::new()), "http://127.0.0.1:1", tokens);
        PlaybackController::new(Arc::new(api), DEFAULT_REFRESH_DELAY)
    }

    #[tokio::test]
    async fn test_invalid_playlist_url_is_returned() {
        let controller = controller();
        let err = controller
            .play_playlist("https://open.spotify.com/album/xyz")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SpotRemoteError>(),
            Some(SpotRemoteError::InvalidPlaylistUrl(_))
        ));
        assert!(!controller.scheduler.has_pending());
    }

    #[tokio::test]
    async fn test_unauthenticated_actions_are_swallowed() {
        let controller = controller();
        controller.toggle_play_pause().await;
        controller.toggle_shuffle().await;
        controller.refresh_now_playing().await;
        assert!(controller.now_playing().is_none());
        assert!(controller.list_devices().await.is_empty());
    }
}
