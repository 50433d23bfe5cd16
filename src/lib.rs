//! spotremote - remote control for Spotify playback
//!
//! This library provides the pieces behind the `spotremote` binary: the
//! PKCE authorization flow, token persistence, the playback controller and
//! the device binding.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: PKCE authorization, token store and the bootstrap state machine
//! - `playback`: control-plane client, controller and now-playing refresh
//! - `device`: two-phase Connect device binding
//! - `storage`: durable key/value port (sled in the binary, memory in tests)
//! - `config`: Configuration management and validation
//! - `logging`: tracing subscriber setup
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: handlers invoked by the binary
//!
//! # Example
//!
//! ```no_run
//! use spotremote::commands::Session;
//! use spotremote::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let session = Session::open(config)?;
//!     session.controller().next_track().await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod playback;
pub mod storage;

// Re-export commonly used types
pub use auth::{AuthManager, AuthState};
pub use config::Config;
pub use error::{Result, SpotRemoteError};
pub use playback::{NowPlaying, PlaybackController};
