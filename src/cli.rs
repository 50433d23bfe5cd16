//! Command-line interface definition for spotremote
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// spotremote - remote control for Spotify playback
///
/// Authorizes with PKCE through the system browser and drives playback on
/// any of your Connect devices.
#[derive(Parser, Debug, Clone)]
#[command(name = "spotremote")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Also append logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Override the token store directory
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for spotremote
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Authorize in the browser and store an access token
    Login,

    /// Forget the stored token
    Logout,

    /// Show whether a usable token is stored
    Status,

    /// Pause when playing, resume otherwise
    PlayPause,

    /// Skip to the next track
    Next,

    /// Skip to the previous track
    Previous,

    /// Toggle shuffle
    Shuffle,

    /// Play a playlist from its share URL
    PlayPlaylist {
        /// e.g. https://open.spotify.com/playlist/<id>
        url: String,
    },

    /// Print the current track
    NowPlaying,

    /// List available Connect devices
    Devices,

    /// Move playback to the configured device
    Connect,

    /// Start an interactive remote shell
    Interactive,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            log_file: None,
            store: None,
            command: Commands::Status,
        }
    }
}
