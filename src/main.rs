//! spotremote - remote control for Spotify playback
//!
#![doc = "Main entry point for the spotremote binary."]

use anyhow::Result;
use colored::Colorize;

use spotremote::cli::{Cli, Commands};
use spotremote::commands::{self, Session};
use spotremote::config::Config;
use spotremote::logging::{init_logging, LoggingOptions};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e.to_string().red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(&LoggingOptions::from_flags(
        cli.verbose,
        cli.json_logs,
        cli.log_file.clone(),
    ))?;

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let session = Session::open(config)?;

    // Execute command
    match cli.command {
        Commands::Login => {
            tracing::info!("Starting authorization");
            commands::auth::login(&session).await
        }
        Commands::Logout => commands::auth::logout(&session),
        Commands::Status => commands::auth::status(&session),
        Commands::PlayPause => commands::playback::play_pause(&session).await,
        Commands::Next => commands::playback::next(&session).await,
        Commands::Previous => commands::playback::previous(&session).await,
        Commands::Shuffle => commands::playback::shuffle(&session).await,
        Commands::PlayPlaylist { url } => commands::playback::play_playlist(&session, &url).await,
        Commands::NowPlaying => commands::playback::now_playing(&session).await,
        Commands::Devices => commands::devices::list(&session).await,
        Commands::Connect => commands::devices::connect(&session).await,
        Commands::Interactive => commands::interactive::run_interactive(&session).await,
    }
}
