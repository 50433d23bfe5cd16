//! Control-plane Web API client
//!
//! Thin typed wrapper over the `/me/player` endpoints. Every call reads the
//! current token right before sending, either from the [`TokenStore`] or
//! from a [`TokenProvider`], so a logout or re-login is picked up by the
//! next request.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use crate::auth::token_store::TokenStore;
use crate::error::{Result, SpotRemoteError};
use crate::playback::types::{CurrentlyPlaying, Device, DevicesResponse, PlaybackState};

/// Supplies the current bearer token, or `None` when logged out
pub type TokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

enum Credentials {
    Store(Arc<TokenStore>),
    Provider(TokenProvider),
}

/// Authenticated client for the player endpoints
pub struct SpotifyApi {
    http: Arc<reqwest::Client>,
    api_base: String,
    credentials: Credentials,
}

impl SpotifyApi {
    /// Creates a client for `api_base` (e.g. `https://api.spotify.com/v1`)
    pub fn new(http: Arc<reqwest::Client>, api_base: &str, tokens: Arc<TokenStore>) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials: Credentials::Store(tokens),
        }
    }

    /// Creates a client that asks `provider` for the bearer on every call
    pub fn with_token_provider(
        http: Arc<reqwest::Client>,
        api_base: &str,
        provider: TokenProvider,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials: Credentials::Provider(provider),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn bearer(&self) -> Result<String> {
        let token = match &self.credentials {
            Credentials::Store(tokens) => tokens.get()?.map(|t| t.value),
            Credentials::Provider(provider) => provider(),
        };
        token.ok_or_else(|| SpotRemoteError::NotAuthenticated.into())
    }

    /// Sends `request` with the bearer header and maps non-success statuses
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.bearer()?;
        let response = request
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpotRemoteError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }
        Ok(response)
    }

    /// Reads a JSON body, treating `204 No Content` as `None`
    async fn optional_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<Option<T>> {
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// `GET /me/player`; `None` when nothing is active
    pub async fn playback_state(&self) -> Result<Option<PlaybackState>> {
        let response = self.send(self.http.get(self.endpoint("/me/player"))).await?;
        Self::optional_json(response).await
    }

    /// `GET /me/player/currently-playing`; `None` when nothing is playing
    pub async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>> {
        let response = self
            .send(self.http.get(self.endpoint("/me/player/currently-playing")))
            .await?;
        Self::optional_json(response).await
    }

    /// `PUT /me/player/play` resuming the current context
    pub async fn play(&self) -> Result<()> {
        self.send(self.http.put(self.endpoint("/me/player/play")))
            .await
            .map(|_| ())
    }

    /// `PUT /me/player/pause`
    pub async fn pause(&self) -> Result<()> {
        self.send(self.http.put(self.endpoint("/me/player/pause")))
            .await
            .map(|_| ())
    }

    /// `POST /me/player/next`
    pub async fn next(&self) -> Result<()> {
        self.send(self.http.post(self.endpoint("/me/player/next")))
            .await
            .map(|_| ())
    }

    /// `POST /me/player/previous`
    pub async fn previous(&self) -> Result<()> {
        self.send(self.http.post(self.endpoint("/me/player/previous")))
            .await
            .map(|_| ())
    }

    /// `PUT /me/player/shuffle?state=<state>`
    pub async fn set_shuffle(&self, state: bool) -> Result<()> {
        let url = format!("{}?state={}", self.endpoint("/me/player/shuffle"), state);
        self.send(self.http.put(url)).await.map(|_| ())
    }

    /// `PUT /me/player/play` with a `context_uri` body
    pub async fn play_context(&self, context_uri: &str) -> Result<()> {
        let body = json!({ "context_uri": context_uri });
        self.send(self.http.put(self.endpoint("/me/player/play")).json(&body))
            .await
            .map(|_| ())
    }

    /// `GET /me/player/devices`
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let response = self
            .send(self.http.get(self.endpoint("/me/player/devices")))
            .await?;
        Ok(Self::optional_json::<DevicesResponse>(response)
            .await?
            .map(|r| r.devices)
            .unwrap_or_default())
    }

    /// `PUT /me/player` moving playback to `device_id`
    pub async fn transfer_playback(&self, device_id: &str) -> Result<()> {
        let body = json!({ "device_ids": [device_id] });
        self.send(self.http.put(self.endpoint("/me/player")).json(&body))
            .await
            .map(|_| ())
    }

    /// `PUT /me/player/volume?volume_percent=<percent>&device_id=<id>`
    pub async fn set_volume(&self, percent: u8, device_id: &str) -> Result<()> {
        let url = format!(
            "{}?volume_percent={}&device_id={}",
            self.endpoint("/me/player/volume"),
            percent.min(100),
            device_id
        );
        self.send(self.http.put(url)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let tokens = Arc::new(TokenStore::new(Arc::new(MemoryStore::new())));
        let api = SpotifyApi::new(
            Arc::new(reqwest::Client::new()),
            "https://api.spotify.com/v1/",
            tokens,
        );
        assert_eq!(
            api.endpoint("/me/player"),
            "https://api.spotify.com/v1/me/player"
        );
    }

    #[tokio::test]
    async fn test_requests_without_token_are_not_authenticated() {
        let tokens = Arc::new(TokenStore::new(Arc::new(MemoryStore::new())));
        // Unroutable base: the call must fail before any request is sent.
        let api = SpotifyApi::new(Arc::new(reqwest::Client::new()), "http://0.0.0.0:1", tokens);
        let err = api.pause().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SpotRemoteError>(),
            Some(SpotRemoteError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_provider_without_token_is_not_authenticated() {
        let api = SpotifyApi::with_token_provider(
            Arc::new(reqwest::Client::new()),
            "http://0.0.0.0:1",
            Arc::new(|| None),
        );
        let err = api.transfer_playback("dev-1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SpotRemoteError>(),
            Some(SpotRemoteError::NotAuthenticated)
        ));
    }
}
