//! Input parser for the interactive remote shell
//!
//! Each line is one command word, optionally followed by an argument.
//! Command words are case-insensitive and most have a short alias.

use thiserror::Error;

/// Errors that can occur when parsing a shell line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType 'help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Actions available in the interactive shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Pause when playing, resume otherwise
    PlayPause,
    /// Skip forward
    Next,
    /// Skip back
    Previous,
    /// Flip shuffle
    Shuffle,
    /// Play the playlist behind a share URL
    PlayPlaylist(String),
    /// Print the current track
    NowPlaying,
    /// Toggle printing track changes as they are published
    ToggleInfo,
    /// List Connect devices
    Devices,
    /// Move playback to the configured device
    Connect,
    /// Show the token status
    Status,
    /// Forget the token and leave the shell
    Logout,
    /// Show available commands
    Help,
    /// Leave the shell
    Exit,
    /// Blank line
    None,
}

/// Parses one line of shell input
///
/// # Examples
///
/// ```
/// use spotremote::commands::shell_commands::{parse_shell_command, ShellCommand};
///
/// assert_eq!(parse_shell_command("N").unwrap(), ShellCommand::Next);
/// assert_eq!(
///     parse_shell_command("playlist https://open.spotify.com/playlist/abc").unwrap(),
///     ShellCommand::PlayPlaylist("https://open.spotify.com/playlist/abc".to_string())
/// );
/// assert!(parse_shell_command("rewind").is_err());
/// ```
pub fn parse_shell_command(input: &str) -> Result<ShellCommand, CommandError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(ShellCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word.to_lowercase().as_str() {
        "play" | "pause" | "p" => Ok(ShellCommand::PlayPause),
        "next" | "n" => Ok(ShellCommand::Next),
        "previous" | "prev" | "b" => Ok(ShellCommand::Previous),
        "shuffle" | "s" => Ok(ShellCommand::Shuffle),
        "playlist" | "pl" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "playlist".to_string(),
                    usage: "playlist <share-url>".to_string(),
                })
            } else {
                Ok(ShellCommand::PlayPlaylist(rest.to_string()))
            }
        }
        "now" | "now-playing" => Ok(ShellCommand::NowPlaying),
        "info" | "i" => Ok(ShellCommand::ToggleInfo),
        "devices" => Ok(ShellCommand::Devices),
        "connect" => Ok(ShellCommand::Connect),
        "status" => Ok(ShellCommand::Status),
        "logout" => Ok(ShellCommand::Logout),
        "help" | "?" | "h" => Ok(ShellCommand::Help),
        "exit" | "quit" | "q" => Ok(ShellCommand::Exit),
        _ => Err(CommandError::UnknownCommand(word.to_string())),
    }
}

/// Prints the shell command reference
pub fn print_help() {
    println!(
        r#"
Remote Commands:

  play | pause | p        Toggle play/pause
  next | n                Next track
  previous | prev | b     Previous track
  shuffle | s             Toggle shuffle
  playlist <url>          Play a playlist from its share URL
  now                     Show the current track
  info | i                Toggle song & artist info on track changes
  devices                 List Connect devices
  connect                 Move playback to the configured device
  status                  Show login status
  logout                  Forget the token and leave
  help | ?                Show this help
  exit | quit | q         Leave the shell
"#
    );
}
