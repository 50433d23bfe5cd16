//! Configuration management for spotremote
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, SpotRemoteError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for spotremote
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Provider endpoints and client registration
    #[serde(default)]
    pub spotify: SpotifyConfig,
    /// Playback controller behavior
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Playback device binding
    #[serde(default)]
    pub device: DeviceConfig,
    /// Durable storage location
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Spotify client registration and endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    /// Client identifier registered with the provider
    #[serde(default)]
    pub client_id: String,

    /// Redirect URI registered with the provider; also the application root
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Base URL of the accounts service (authorize and token endpoints)
    ///
    /// Overridable so tests can point the flow at a mock server.
    #[serde(default = "default_accounts_base")]
    pub accounts_base: String,

    /// Base URL of the control-plane Web API
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:8888/callback".to_string()
}

fn default_accounts_base() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_api_base() -> String {
    "https://api.spotify.com/v1".to_string()
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: default_redirect_uri(),
            accounts_base: default_accounts_base(),
            api_base: default_api_base(),
        }
    }
}

impl SpotifyConfig {
    /// Authorization endpoint derived from `accounts_base`
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/authorize", self.accounts_base.trim_end_matches('/'))
    }

    /// Token endpoint derived from `accounts_base`
    pub fn token_endpoint(&self) -> String {
        format!("{}/api/token", self.accounts_base.trim_end_matches('/'))
    }
}

/// Playback controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Delay before re-querying now-playing after a skip or context change
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
}

fn default_refresh_delay_ms() -> u64 {
    500
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: default_refresh_delay_ms(),
        }
    }
}

/// Playback device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name to bind to; `None` binds the first listed device
    #[serde(default = "default_device_name")]
    pub name: Option<String>,

    /// Initial volume in `0.0..=1.0`
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Number of device-list polls before giving up on readiness
    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,

    /// Interval between device-list polls
    #[serde(default = "default_ready_interval_ms")]
    pub ready_interval_ms: u64,
}

fn default_device_name() -> Option<String> {
    Some("spotremote".to_string())
}

fn default_volume() -> f32 {
    0.5
}

fn default_ready_attempts() -> u32 {
    10
}

fn default_ready_interval_ms() -> u64 {
    500
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            volume: default_volume(),
            ready_attempts: default_ready_attempts(),
            ready_interval_ms: default_ready_interval_ms(),
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory of the key/value database; defaults to the platform data dir
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SpotRemoteError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| SpotRemoteError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(client_id) = std::env::var("SPOTREMOTE_CLIENT_ID") {
            self.spotify.client_id = client_id;
        }

        if let Ok(redirect_uri) = std::env::var("SPOTREMOTE_REDIRECT_URI") {
            self.spotify.redirect_uri = redirect_uri;
        }

        if let Ok(accounts_base) = std::env::var("SPOTREMOTE_ACCOUNTS_BASE") {
            self.spotify.accounts_base = accounts_base;
        }

        if let Ok(api_base) = std::env::var("SPOTREMOTE_API_BASE") {
            self.spotify.api_base = api_base;
        }

        if let Ok(store_path) = std::env::var("SPOTREMOTE_STORE_PATH") {
            self.storage.path = Some(PathBuf::from(store_path));
        }

        if let Ok(device_name) = std::env::var("SPOTREMOTE_DEVICE_NAME") {
            self.device.name = if device_name.is_empty() {
                None
            } else {
                Some(device_name)
            };
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(store) = &cli.store {
            self.storage.path = Some(store.clone());
        }
    }

    /// Parsed redirect URI (the application root)
    ///
    /// # Errors
    ///
    /// Returns `SpotRemoteError::Config` if the URI does not parse
    pub fn redirect_url(&self) -> Result<Url> {
        Url::parse(&self.spotify.redirect_uri).map_err(|e| {
            SpotRemoteError::Config(format!(
                "Invalid redirect_uri {}: {}",
                self.spotify.redirect_uri, e
            ))
            .into()
        })
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.spotify.client_id.trim().is_empty() {
            return Err(SpotRemoteError::Config(
                "spotify.client_id cannot be empty (set SPOTREMOTE_CLIENT_ID)".to_string(),
            )
            .into());
        }

        let redirect = self.redirect_url()?;
        if redirect.scheme() != "http" {
            return Err(SpotRemoteError::Config(
                "spotify.redirect_uri must use http on a loopback host".to_string(),
            )
            .into());
        }
        match redirect.host_str() {
            Some("127.0.0.1") | Some("localhost") | Some("[::1]") => {}
            _ => {
                return Err(SpotRemoteError::Config(
                    "spotify.redirect_uri must point at a loopback host".to_string(),
                )
                .into())
            }
        }
        if redirect.port().is_none() {
            return Err(SpotRemoteError::Config(
                "spotify.redirect_uri must include an explicit port".to_string(),
            )
            .into());
        }

        for (name, base) in [
            ("spotify.accounts_base", &self.spotify.accounts_base),
            ("spotify.api_base", &self.spotify.api_base),
        ] {
            Url::parse(base)
                .map_err(|e| SpotRemoteError::Config(format!("Invalid {}: {}", name, e)))?;
        }

        if !(0.0..=1.0).contains(&self.device.volume) {
            return Err(SpotRemoteError::Config(
                "device.volume must be between 0.0 and 1.0".to_string(),
            )
            .into());
        }

        if self.device.ready_attempts == 0 {
            return Err(SpotRemoteError::Config(
                "device.ready_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
