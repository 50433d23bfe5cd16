/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`        — login, logout and token status
- `playback`    — single-shot playback actions
- `devices`     — Connect device listing and binding
- `interactive` — the readline remote shell

Every handler works on a [`Session`], which wires storage, authorization
and the playback controller from one [`Config`].
*/

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use crate::auth::{AuthManager, Navigator, SystemBrowser, TokenStore};
use crate::config::Config;
use crate::device::{PlaybackDevice, TokenProvider};
use crate::error::{Result, SpotRemoteError};
use crate::playback::{PlaybackController, SpotifyApi};
use crate::storage::{open_store, KeyValueStore};

// Shell input parser
pub mod shell_commands;

/// Everything a command needs, built once per invocation
pub struct Session {
    config: Config,
    http: Arc<reqwest::Client>,
    auth: AuthManager,
    controller: PlaybackController,
}

impl Session {
    /// Opens the configured store and drives the system browser
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be opened or the redirect URI is invalid.
    pub fn open(config: Config) -> Result<Self> {
        let store = open_store(config.storage.path.as_deref())?;
        let navigator = Arc::new(SystemBrowser::new(config.redirect_url()?));
        Self::with_parts(config, store, navigator)
    }

    /// Builds a session over explicit storage and navigator
    pub fn with_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http = Arc::new(
            reqwest::Client::builder()
                .user_agent(concat!("spotremote/", env!("CARGO_PKG_VERSION")))
                .build()?,
        );
        let auth = AuthManager::new(&config, Arc::clone(&http), store, navigator)?;
        let api = SpotifyApi::new(Arc::clone(&http), &config.spotify.api_base, auth.tokens());
        let controller = PlaybackController::new(
            Arc::new(api),
            Duration::from_millis(config.playback.refresh_delay_ms),
        );

        Ok(Self {
            config,
            http,
            auth,
            controller,
        })
    }

    /// The authorization manager
    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// The playback controller
    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    fn tokens(&self) -> Arc<TokenStore> {
        self.auth.tokens()
    }

    /// Fails with `NotAuthenticated` unless a usable token is stored
    fn require_token(&self) -> Result<()> {
        match self.tokens().get()? {
            Some(_) => Ok(()),
            None => Err(SpotRemoteError::NotAuthenticated.into()),
        }
    }

    /// Device binding that reads the token from this session's store
    pub fn playback_device(&self) -> PlaybackDevice {
        let tokens = self.tokens();
        let provider: TokenProvider = Arc::new(move || match tokens.get() {
            Ok(token) => token.map(|t| t.value),
            Err(e) => {
                tracing::warn!("Failed to read token: {}", e);
                None
            }
        });
        PlaybackDevice::new(
            self.config.device.clone(),
            provider,
            Arc::clone(&self.http),
            &self.config.spotify.api_base,
        )
    }
}

fn print_now_playing(controller: &PlaybackController) {
    match controller.now_playing() {
        Some(track) => println!("{} {}", "♪".green(), track.to_string().bold()),
        None => println!("{}", "Nothing playing".dimmed()),
    }
}

/// Auth command handlers
pub mod auth {
    use super::*;
    use crate::auth::callback::RedirectListener;
    use crate::auth::TokenStatus;

    /// Runs the browser authorization flow until a token is stored
    ///
    /// A valid stored token is reused without binding the redirect port.
    pub async fn login(session: &Session) -> Result<()> {
        let token = match session.tokens().get()? {
            Some(token) => {
                println!("{}", "Already logged in".green());
                token
            }
            None => {
                let listener = RedirectListener::bind(session.auth().root()).await?;
                let token = session.auth().login(&listener).await?;
                println!("{}", "Logged in".green());
                token
            }
        };
        println!(
            "Token valid until {}",
            token.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(())
    }

    /// Forgets the stored token
    pub fn logout(session: &Session) -> Result<()> {
        session.auth().logout()?;
        println!("{}", "Logged out".yellow());
        Ok(())
    }

    /// Prints the token status without side effects
    pub fn status(session: &Session) -> Result<()> {
        match session.tokens().lookup()? {
            TokenStatus::Valid(token) => println!(
                "{} until {}",
                "Authenticated".green(),
                token.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            TokenStatus::Missing => println!("{}", "Not logged in".yellow()),
            TokenStatus::Expired => {
                println!("{}", "Token expired; run `spotremote login`".yellow())
            }
            TokenStatus::Malformed(reason) => {
                println!("{} ({})", "Stored token is malformed".red(), reason)
            }
        }
        Ok(())
    }
}

/// Single-shot playback handlers
///
/// Provider failures are logged by the controller, so these succeed once a
/// token is present.
pub mod playback {
    use super::*;
    use crate::playback::playlist::playlist_id;

    /// Toggles play/pause and prints the current track
    pub async fn play_pause(session: &Session) -> Result<()> {
        session.require_token()?;
        session.controller().toggle_play_pause().await;
        print_now_playing(session.controller());
        Ok(())
    }

    /// Skips forward and prints the track once it settles
    pub async fn next(session: &Session) -> Result<()> {
        session.require_token()?;
        session.controller().next_track().await;
        session.controller().settle().await;
        print_now_playing(session.controller());
        Ok(())
    }

    /// Skips back and prints the track once it settles
    pub async fn previous(session: &Session) -> Result<()> {
        session.require_token()?;
        session.controller().previous_track().await;
        session.controller().settle().await;
        print_now_playing(session.controller());
        Ok(())
    }

    /// Flips shuffle
    pub async fn shuffle(session: &Session) -> Result<()> {
        session.require_token()?;
        session.controller().toggle_shuffle().await;
        Ok(())
    }

    /// Plays the playlist behind `url`
    ///
    /// The URL is validated before the token so a typo is reported even
    /// when logged out.
    pub async fn play_playlist(session: &Session, url: &str) -> Result<()> {
        playlist_id(url)?;
        session.require_token()?;
        session.controller().play_playlist(url).await?;
        session.controller().settle().await;
        print_now_playing(session.controller());
        Ok(())
    }

    /// Prints the current track
    pub async fn now_playing(session: &Session) -> Result<()> {
        session.require_token()?;
        session.controller().refresh_now_playing().await;
        print_now_playing(session.controller());
        Ok(())
    }
}

/// Device handlers
pub mod devices {
    use super::*;
    use crate::device::Player;

    /// Prints the user's Connect devices
    pub async fn list(session: &Session) -> Result<()> {
        session.require_token()?;
        let devices = session.controller().list_devices().await;
        if devices.is_empty() {
            println!("{}", "No devices available".dimmed());
            return Ok(());
        }

        println!("{:<3} {:<30} {:<12} {}", "", "Name", "Type", "Volume");
        for device in devices {
            let marker = if device.is_active { "*".green() } else { " ".normal() };
            let volume = device
                .volume_percent
                .map(|v| format!("{}%", v))
                .unwrap_or_else(|| "-".to_string());
            println!("{:<3} {:<30} {:<12} {}", marker, device.name, device.device_type, volume);
        }
        Ok(())
    }

    /// Waits for the configured device and moves playback onto it
    pub async fn connect(session: &Session) -> Result<()> {
        session.require_token()?;
        let device = session.playback_device();
        let id = device.ready().await?;
        if device.connect().await {
            println!("{} {}", "Connected to".green(), id);
            Ok(())
        } else {
            Err(SpotRemoteError::DeviceUnavailable(format!("could not transfer playback to {}", id)).into())
        }
    }
}

/// Interactive remote shell
pub mod interactive {
    use super::*;
    use super::shell_commands::{parse_shell_command, print_help, ShellCommand};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Runs the shell until `exit`, Ctrl-C or Ctrl-D
    pub async fn run_interactive(session: &Session) -> Result<()> {
        session.require_token()?;
        tracing::info!("Starting interactive remote");

        let mut rl = DefaultEditor::new()?;
        let show_info = Arc::new(AtomicBool::new(true));

        let mut updates = session.controller().subscribe();
        let printer_flag = Arc::clone(&show_info);
        let printer = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                if !printer_flag.load(Ordering::SeqCst) {
                    continue;
                }
                let current = updates.borrow_and_update().clone();
                if let Some(track) = current {
                    println!("\n{} {}", "♪".green(), track.to_string().bold());
                }
            }
        });

        println!("{}", "spotremote interactive mode".bold());
        println!("Type 'help' for commands, 'exit' to leave.\n");
        session.controller().refresh_now_playing().await;

        loop {
            match rl.readline(&format!("{} ", "remote>".cyan())) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    let command = match parse_shell_command(&line) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    if !execute(session, command, &show_info).await? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        printer.abort();
        println!("Goodbye!");
        Ok(())
    }

    /// Runs one shell command; `false` ends the session
    ///
    /// Command failures are printed and the shell keeps going. Only storage
    /// errors from status and logout end it with an error.
    pub(super) async fn execute(
        session: &Session,
        command: ShellCommand,
        show_info: &AtomicBool,
    ) -> Result<bool> {
        match command {
            ShellCommand::None => {}
            ShellCommand::PlayPause => session.controller().toggle_play_pause().await,
            ShellCommand::Next => session.controller().next_track().await,
            ShellCommand::Previous => session.controller().previous_track().await,
            ShellCommand::Shuffle => session.controller().toggle_shuffle().await,
            ShellCommand::PlayPlaylist(url) => {
                if let Err(e) = session.controller().play_playlist(&url).await {
                    eprintln!("{}", e.to_string().red());
                }
            }
            ShellCommand::NowPlaying => {
                session.controller().refresh_now_playing().await;
                print_now_playing(session.controller());
            }
            ShellCommand::ToggleInfo => {
                let shown = !show_info.fetch_xor(true, Ordering::SeqCst);
                println!("Song & artist info {}", if shown { "on" } else { "off" });
            }
            ShellCommand::Devices => {
                if let Err(e) = devices::list(session).await {
                    eprintln!("{}", e.to_string().red());
                }
            }
            ShellCommand::Connect => {
                if let Err(e) = devices::connect(session).await {
                    eprintln!("{}", e.to_string().red());
                }
            }
            ShellCommand::Status => auth::status(session)?,
            ShellCommand::Logout => {
                auth::logout(session)?;
                return Ok(false);
            }
            ShellCommand::Help => print_help(),
            ShellCommand::Exit => return Ok(false),
        }
        Ok(true)
    }
}
