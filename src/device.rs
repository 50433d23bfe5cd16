//! Playback device binding
//!
//! Binding is two-phase: [`Player::ready`] waits until the device shows up
//! in the user's Connect device list, then [`Player::connect`] moves
//! playback onto it and applies the configured volume. Requests go through
//! [`SpotifyApi`], with the token pulled from a provider callback on every
//! request.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::DeviceConfig;
use crate::error::{Result, SpotRemoteError};
use crate::playback::client::SpotifyApi;
use crate::playback::types::Device;

pub use crate::playback::client::TokenProvider;

/// A device that can receive playback
#[async_trait]
pub trait Player: Send + Sync {
    /// Waits until the device is registered and returns its id
    async fn ready(&self) -> Result<String>;

    /// Transfers playback to the ready device; `false` on any failure
    async fn connect(&self) -> bool;
}

/// A Connect device located by name
pub struct PlaybackDevice {
    config: DeviceConfig,
    api: SpotifyApi,
    device_id: Mutex<Option<String>>,
}

impl PlaybackDevice {
    /// Creates an unbound device
    pub fn new(
        config: DeviceConfig,
        token_provider: TokenProvider,
        http: Arc<reqwest::Client>,
        api_base: &str,
    ) -> Self {
        Self {
            config,
            api: SpotifyApi::with_token_provider(http, api_base, token_provider),
            device_id: Mutex::new(None),
        }
    }

    /// Id resolved by the last successful [`Player::ready`]
    pub fn device_id(&self) -> Option<String> {
        self.device_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn volume_percent(&self) -> u8 {
        (self.config.volume.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    fn select<'a>(&self, devices: &'a [Device]) -> Option<&'a Device> {
        match self.config.name.as_deref() {
            Some(name) => devices.iter().find(|d| d.name == name && d.id.is_some()),
            None => devices.iter().find(|d| d.id.is_some()),
        }
    }
}

#[async_trait]
impl Player for PlaybackDevice {
    async fn ready(&self) -> Result<String> {
        let wanted = self.config.name.as_deref().unwrap_or("any device");
        let interval = Duration::from_millis(self.config.ready_interval_ms);

        for attempt in 1..=self.config.ready_attempts {
            match self.api.devices().await {
                Ok(devices) => {
                    if let Some(id) = self.select(&devices).and_then(|d| d.id.clone()) {
                        tracing::info!("Ready with Device ID {}", id);
                        *self.device_id.lock().unwrap_or_else(|e| e.into_inner()) =
                            Some(id.clone());
                        return Ok(id);
                    }
                    tracing::debug!(
                        "Device '{}' not listed yet (attempt {}/{})",
                        wanted,
                        attempt,
                        self.config.ready_attempts
                    );
                }
                Err(e) => {
                    if matches!(
                        e.downcast_ref::<SpotRemoteError>(),
                        Some(SpotRemoteError::NotAuthenticated)
                    ) {
                        return Err(e);
                    }
                    tracing::warn!("Device lookup failed: {}", e);
                }
            }

            if attempt < self.config.ready_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(SpotRemoteError::DeviceUnavailable(format!(
            "'{}' not found after {} attempts",
            wanted, self.config.ready_attempts
        ))
        .into())
    }

    async fn connect(&self) -> bool {
        let Some(id) = self.device_id() else {
            tracing::warn!("connect called before the device was ready");
            return false;
        };

        if let Err(e) = self.api.transfer_playback(&id).await {
            tracing::error!("Failed to transfer playback to {}: {}", id, e);
            return false;
        }

        if let Err(e) = self.api.set_volume(self.volume_percent(), &id).await {
            tracing::error!("Failed to set volume on {}: {}", id, e);
            return false;
        }

        tracing::info!("Connected to device {}", id);
        true
    }
}
