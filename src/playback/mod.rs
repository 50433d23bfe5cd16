//! Playback control against the provider's Web API
//!
//! - [`client`]     -- authenticated `/me/player` calls
//! - [`controller`] -- user actions and now-playing publication
//! - [`refresh`]    -- superseding delayed refresh
//! - [`playlist`]   -- share URL parsing
//! - [`types`]      -- API payloads

pub mod client;
pub mod controller;
pub mod playlist;
pub mod refresh;
pub mod types;

pub use client::{SpotifyApi, TokenProvider};
pub use controller::PlaybackController;
pub use types::{Device, NowPlaying};
