//! Playlist URL parsing

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Result, SpotRemoteError};

fn playlist_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"playlist/([a-zA-Z0-9]+)").expect("valid playlist regex"))
}

/// Extracts the playlist id from a share URL
///
/// Matches the first `playlist/<alphanumerics>` segment anywhere in the
/// input, so query strings and `intl-xx/` path prefixes are tolerated.
///
/// # Errors
///
/// Returns [`SpotRemoteError::InvalidPlaylistUrl`] when there is no match.
///
/// # Examples
///
/// ```
/// use spotremote::playback::playlist::playlist_id;
///
/// let id = playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc").unwrap();
/// assert_eq!(id, "37i9dQZF1DXcBWIGoYBM5M");
/// assert!(playlist_id("https://open.spotify.com/album/123").is_err());
/// ```
pub fn playlist_id(url: &str) -> Result<String> {
    playlist_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SpotRemoteError::InvalidPlaylistUrl(url.to_string()).into())
}

/// The context URI the play endpoint expects for a playlist id
pub fn playlist_context_uri(id: &str) -> String {
    format!("spotify:playlist:{}", id)
}
